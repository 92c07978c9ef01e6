pub mod reconciler;
pub mod typing;

pub use reconciler::Reconciler;
