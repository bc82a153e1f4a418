// Requests
pub mod create_task_request;
pub mod update_task_request;
pub mod task_status_request;
pub mod project_request;
pub mod subtask_request;
pub mod time_entry_request;
pub mod dependency_request;
pub mod login_request;
pub mod register_request;
pub mod mark_read_request;
pub mod list_query;

// Responses
pub mod task_view;
pub mod project_view;
pub mod activity_view;
pub mod auth_response;

mod nullable;
