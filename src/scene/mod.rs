// Transform hierarchy consumed by the animation core
// Controllers write local transforms/colors; the renderer reads world transforms.

pub mod graph;
pub mod node;
pub mod rig;

pub use graph::SceneGraph;
pub use node::{Node, NodeId, translation_of, with_translation_of};
pub use rig::Rig;
