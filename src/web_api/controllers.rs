pub mod authentication_controller;
pub mod dashboard_controller;
pub mod dependency_controller;
pub mod health_controller;
pub mod notification_controller;
pub mod project_controller;
pub mod subtask_controller;
pub mod task_controller;
pub mod time_controller;
