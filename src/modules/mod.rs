pub mod anti_link;
pub mod forward_info;
pub mod invite_tracking;
