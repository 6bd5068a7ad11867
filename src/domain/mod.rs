// Domain layer: records flowing through the pipeline and the ports to external collaborators.

pub mod model;
pub mod ports;
