//! Notebook API model types.

mod entity;
mod material;
mod notebook;
mod sample;
mod table;
mod user;

pub use entity::*;
pub use material::*;
pub use notebook::*;
pub use sample::*;
pub use table::*;
pub use user::*;
