pub mod bounds;
pub mod factory;

pub use bounds::{ParamType, ParameterBound, ParameterSpace};
pub use factory::CandidateFactory;
