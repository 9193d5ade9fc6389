pub mod columns;
pub mod text;
