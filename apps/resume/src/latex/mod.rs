// LaTeX rendering (content -> section files) and extraction (section files -> content).

pub mod escape;
pub mod generator;
pub mod parser;

pub use escape::clean_latex;
pub use generator::LatexGenerator;
pub use parser::parse_project_dir;
