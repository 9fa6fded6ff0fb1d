//! One-time group construction from the firmware's module descriptor.

use stepgen_common::hal::consts::{
    INSTANCE_STRIDE, MULTIPLE_REGISTERS, NUM_REGISTERS, SUPPORTED_VERSIONS,
};
use stepgen_common::hal::types::{InstanceRequest, ModuleDescriptor};
use tracing::{info, warn};

use crate::error::SetupError;
use crate::group::ChannelGroup;

/// Check that `md` has a layout this driver can run.
///
/// Version 0 firmware is accepted with a warning.
pub fn validate_descriptor(md: &ModuleDescriptor) -> Result<(), SetupError> {
    if !SUPPORTED_VERSIONS.contains(&md.version) {
        return Err(SetupError::UnsupportedLayout(format!(
            "version {} not supported",
            md.version
        )));
    }
    if md.num_registers != NUM_REGISTERS {
        return Err(SetupError::UnsupportedLayout(format!(
            "expected {} registers, got {}",
            NUM_REGISTERS, md.num_registers
        )));
    }
    if md.instance_stride != INSTANCE_STRIDE {
        return Err(SetupError::UnsupportedLayout(format!(
            "expected instance stride {}, got {}",
            INSTANCE_STRIDE, md.instance_stride
        )));
    }
    if md.multiple_registers != MULTIPLE_REGISTERS {
        return Err(SetupError::UnsupportedLayout(format!(
            "expected multiple registers 0x{:04X}, got 0x{:04X}",
            MULTIPLE_REGISTERS, md.multiple_registers
        )));
    }
    if md.clock_frequency_hz == 0 {
        return Err(SetupError::ZeroClock);
    }
    if md.register_map().end_address().is_none() {
        return Err(SetupError::UnsupportedLayout(format!(
            "registers at 0x{:08X} with stride 0x{:X} overflow the address space",
            md.base_address, md.register_stride
        )));
    }

    if md.version == 0 {
        warn!("StepGen version 0 firmware: high step rates require zero stepspace");
    }
    Ok(())
}

/// Builds a [`ChannelGroup`] from at most one module descriptor.
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    request: InstanceRequest,
    descriptor: Option<ModuleDescriptor>,
}

impl GroupBuilder {
    /// Builder claiming `request` instances.
    pub fn new(request: InstanceRequest) -> Self {
        Self {
            request,
            descriptor: None,
        }
    }

    /// Offer a module descriptor. Only one is accepted.
    pub fn add_descriptor(&mut self, md: ModuleDescriptor) -> Result<(), SetupError> {
        if self.descriptor.is_some() {
            return Err(SetupError::DuplicateDescriptor);
        }
        validate_descriptor(&md)?;
        self.descriptor = Some(md);
        Ok(())
    }

    /// Size and allocate the group.
    ///
    /// Without a descriptor, or with `Count(0)`, the group is empty.
    pub fn build(self) -> Result<ChannelGroup, SetupError> {
        let Some(md) = self.descriptor else {
            info!("No StepGen module, 0 instances");
            return Ok(ChannelGroup::empty());
        };

        let available = md.instances as usize;
        let count = match self.request {
            InstanceRequest::All => available,
            InstanceRequest::Count(n) if n > available => {
                return Err(SetupError::InsufficientInstances {
                    requested: n,
                    available,
                });
            }
            InstanceRequest::Count(n) => n,
        };

        let group = ChannelGroup::new(&md, count)?;
        info!(
            "StepGen: {} of {} instances, clock {} Hz",
            count, available, md.clock_frequency_hz
        );
        Ok(group)
    }
}
