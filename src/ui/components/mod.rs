pub mod chat_area;
pub mod send_form;
pub mod status_panel;
