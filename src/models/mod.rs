pub mod condition;
pub mod consultation;
pub mod enums;
pub mod filters;
pub mod image;
pub mod narrative;
pub mod symptom;

pub use condition::*;
pub use consultation::*;
pub use filters::*;
pub use image::*;
pub use narrative::*;
pub use symptom::*;
