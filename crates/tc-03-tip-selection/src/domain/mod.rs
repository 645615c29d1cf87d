//! Domain logic for tip selection.

pub mod rating;
pub mod validator;
pub mod walker;
