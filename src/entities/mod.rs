//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities mirror the back-office tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod blog_post;
pub mod brand;
pub mod category;
pub mod collection;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod product_collection;
pub mod product_variant;
pub mod values;
pub mod variant_image;

// Re-export specific types to avoid conflicts
pub use blog_post::{Entity as BlogPost, Model as BlogPostModel, PostStatus};
pub use brand::{Entity as Brand, Model as BrandModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use collection::{CollectionType, Entity as Collection, Model as CollectionModel};
pub use customer::{Entity as Customer, Model as CustomerModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus, PaymentStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use product::{Entity as Product, InventoryStatus, Model as ProductModel};
pub use product_category::Entity as ProductCategory;
pub use product_collection::Entity as ProductCollection;
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel};
pub use variant_image::{Entity as VariantImage, Model as VariantImageModel};
