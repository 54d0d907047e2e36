//! Categories for transactions, organised as parents and children.

mod categories_page;
mod core;
mod create;
mod dedupe;
mod delete;
mod edit;
mod form;

pub use categories_page::{get_categories_json, get_categories_page};
pub use core::{
    Category, CategoryId, CategoryKind, NewCategory, create_category, create_category_table,
    delete_category, get_all_categories, get_category, get_category_options,
    get_or_create_category, update_category,
};
pub use create::{CategoryState, create_category_endpoint, get_new_category_page};
pub use dedupe::{
    DeduplicateCategoriesState, DeduplicationSummary, deduplicate_categories,
    deduplicate_categories_endpoint,
};
pub use delete::delete_category_endpoint;
pub use edit::{get_edit_category_page, update_category_endpoint};
