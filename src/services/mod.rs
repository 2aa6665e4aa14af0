pub mod image_prober;
pub mod renderer;
pub mod request_assembler;
pub mod tutor_service;

pub use image_prober::ImageProber;
pub use renderer::{clean_latex_markdown, render, History};
pub use request_assembler::RequestAssembler;
pub use tutor_service::TutoringGateway;
