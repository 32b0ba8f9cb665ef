pub mod channel;
pub mod device;
pub mod status;

pub use channel::{ChannelConfig, LiveInfo, SubChannel};
pub use device::DeviceProfile;
pub use status::{ChannelStatus, StatusLevel};
