pub mod identity_service;
pub mod room_service;
pub mod doc_edit_service;
pub mod channel_service;
