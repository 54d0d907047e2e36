//! Places where transactions happen.

mod core;
mod handlers;

pub use core::{
    Location, LocationId, create_location, create_location_table, delete_location,
    get_all_locations, get_location, get_or_create_location, update_location,
};
pub use handlers::{
    LocationForm, LocationState, create_location_endpoint, delete_location_endpoint,
    get_edit_location_page, get_locations_json, get_locations_page, get_new_location_page,
    update_location_endpoint,
};
