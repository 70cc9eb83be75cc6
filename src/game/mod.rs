//! Character locomotion: physics wrapper, input adapters, stamina and the fixed-step driver.

pub mod character;
pub mod constants;
pub mod ground;
pub mod input;
pub mod locomotion;
pub mod observation;
pub mod physics;
pub mod simulation;
pub mod stamina;

pub use character::{CharacterRig, CharacterRigBuilder, RigError};
pub use ground::GroundSensor;
pub use input::{AgentAction, AgentInputProvider, DeviceInputProvider, DeviceState, InputSource};
pub use locomotion::{LocomotionController, TickOutcome};
pub use observation::Observation;
pub use physics::{BodyState, PhysicsWorld};
pub use simulation::{CharacterId, Simulation, SimulationError, TriggerEvent, TriggerPhase};
pub use stamina::{StaminaChanged, StaminaHandle, StaminaPool};
