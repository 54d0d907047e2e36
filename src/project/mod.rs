//! Projects that group related transactions.

mod core;
mod handlers;

pub use core::{
    NewProject, Project, ProjectId, create_project, create_project_table, delete_project,
    get_all_projects, get_or_create_project, get_project, update_project,
};
pub use handlers::{
    ProjectForm, ProjectState, create_project_endpoint, delete_project_endpoint,
    get_edit_project_page, get_new_project_page, get_projects_json, get_projects_page,
    update_project_endpoint,
};
