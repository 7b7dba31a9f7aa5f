//! Launch geometry for device kernels
//!
//! A launch covers `units` element indices with a grid of work-groups. Every
//! group holds `block.x` lanes and lane `g * block.x + l` handles one element.
//! Lanes whose global index is `>= units` do nothing.

use std::fmt;

/// Largest work-group a launch may request.
pub const MAX_WORK_GROUP_SIZE: u32 = 1024;

/// Default work-group size used by the collection kernels.
pub const WORK_GROUP_SIZE: u32 = 1024;

/// Number of work-groups in a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDim {
    pub x: u32,
}

impl GridDim {
    pub const fn linear(groups: u32) -> Self {
        Self { x: groups }
    }

    pub const fn total_groups(&self) -> u64 {
        self.x as u64
    }
}

impl fmt::Display for GridDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.x)
    }
}

/// Lanes per work-group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockDim {
    pub x: u32,
}

impl BlockDim {
    pub const fn linear(lanes: u32) -> Self {
        Self { x: lanes }
    }

    pub const fn total_lanes(&self) -> u32 {
        self.x
    }
}

impl fmt::Display for BlockDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.x)
    }
}

/// Grid and block shape of one kernel launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaunchConfig {
    pub grid: GridDim,
    pub block: BlockDim,
}

impl LaunchConfig {
    pub const fn new(grid: GridDim, block: BlockDim) -> Self {
        Self { grid, block }
    }

    /// One-dimensional launch covering `units` elements with groups of
    /// `group_size` lanes: `ceil(units / group_size)` groups.
    ///
    /// A zero `group_size` produces a config that [`LaunchConfig::validate`]
    /// rejects.
    pub fn linear(units: usize, group_size: u32) -> Self {
        let groups = if group_size == 0 {
            0
        } else {
            units.div_ceil(group_size as usize)
        };
        Self {
            grid: GridDim::linear(u32::try_from(groups).unwrap_or(u32::MAX)),
            block: BlockDim::linear(group_size),
        }
    }

    pub const fn total_groups(&self) -> u64 {
        self.grid.total_groups()
    }

    pub const fn total_lanes(&self) -> u64 {
        self.grid.total_groups() * self.block.total_lanes() as u64
    }

    /// Lanes per group as a slice chunk length.
    pub const fn group_len(&self) -> usize {
        self.block.x as usize
    }

    /// Reason this config cannot run `units` elements, if any.
    pub fn validate(&self, units: usize) -> Result<(), String> {
        if self.block.x == 0 || self.block.x > MAX_WORK_GROUP_SIZE {
            return Err(format!(
                "work-group size {} outside 1..={MAX_WORK_GROUP_SIZE}",
                self.block.x
            ));
        }
        if self.grid.x == 0 {
            return Err("empty grid".to_string());
        }
        if self.total_lanes() < units as u64 {
            return Err(format!(
                "grid {} x block {} covers {} lanes, {units} needed",
                self.grid,
                self.block,
                self.total_lanes()
            ));
        }
        Ok(())
    }
}

impl fmt::Display for LaunchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid={}, block={}", self.grid, self.block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_rounds_groups_up() {
        let config = LaunchConfig::linear(1000, 256);
        assert_eq!(config.grid.x, 4);
        assert_eq!(config.block.x, 256);
        assert_eq!(config.total_lanes(), 1024);
        assert!(config.validate(1000).is_ok());

        let exact = LaunchConfig::linear(2048, 1024);
        assert_eq!(exact.total_groups(), 2);
    }

    #[test]
    fn rejects_bad_group_sizes() {
        assert!(LaunchConfig::linear(10, 0).validate(10).is_err());

        let oversized = LaunchConfig::new(GridDim::linear(1), BlockDim::linear(MAX_WORK_GROUP_SIZE + 1));
        let reason = oversized.validate(1).unwrap_err();
        assert!(reason.contains("outside"));
    }

    #[test]
    fn rejects_grids_that_miss_elements() {
        let short = LaunchConfig::new(GridDim::linear(2), BlockDim::linear(4));
        assert!(short.validate(8).is_ok());
        assert!(short.validate(9).is_err());
        assert!(LaunchConfig::new(GridDim::linear(0), BlockDim::linear(4)).validate(0).is_err());
    }

    #[test]
    fn display_shows_shape() {
        assert_eq!(LaunchConfig::linear(5, 2).to_string(), "grid=(3), block=(2)");
    }
}
