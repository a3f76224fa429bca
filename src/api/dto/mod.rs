//! Data Transfer Objects for REST request/response serialization.

pub mod click_dto;
pub mod object_dto;
pub mod session_dto;

pub use click_dto::*;
pub use object_dto::*;
pub use session_dto::*;
