pub mod chat_view;
pub mod main_window;
