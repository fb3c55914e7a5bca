//! Group/table chaining
//!
//! Rules installed in a group or table other than 0 are only reached if
//! something in table 0 forwards traffic there. [`GroupChainer`] produces
//! that forwarding entry: a [`JumpRule`] matching all Ethernet traffic (or a
//! caller-chosen Ethernet match) and jumping to the target. It exists only
//! while an artifact is rendered and is never part of a [`RuleSet`].
//!
//! [`RuleSet`]: crate::core::rule::RuleSet

use crate::core::rule::LayerMatches;

/// Synthetic first line of a chained artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpRule {
    /// Group or table jumped to, always > 0
    pub target: u32,
    /// Ethernet-layer match, empty for "all traffic"
    pub ethernet: LayerMatches,
    /// Whether to attach a counting action
    pub count: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupChainer {
    target: Option<u32>,
    count: bool,
}

impl GroupChainer {
    pub const fn new(target: Option<u32>, count: bool) -> Self {
        Self { target, count }
    }

    /// True when artifacts start with a jump rule.
    pub const fn chains(&self) -> bool {
        matches!(self.target, Some(target) if target > 0)
    }

    /// The jump rule for an artifact, or `None` when rules live in group 0
    /// (or no group was requested).
    pub fn jump_rule(&self, ethernet: LayerMatches) -> Option<JumpRule> {
        match self.target {
            Some(target) if target > 0 => Some(JumpRule {
                target,
                ethernet,
                count: self.count,
            }),
            _ => None,
        }
    }

    /// Rules to synthesize so the artifact holds `requested` lines in total.
    pub const fn rule_budget(&self, requested: usize) -> usize {
        if self.chains() {
            requested.saturating_sub(1)
        } else {
            requested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_jump_for_group_zero_or_none() {
        assert!(GroupChainer::new(Some(0), true).jump_rule(LayerMatches::default()).is_none());
        assert!(GroupChainer::new(None, false).jump_rule(LayerMatches::default()).is_none());
    }

    #[test]
    fn test_jump_for_positive_group() {
        let jump = GroupChainer::new(Some(3), true)
            .jump_rule(LayerMatches::default())
            .unwrap();
        assert_eq!(jump.target, 3);
        assert!(jump.count);
        assert!(jump.ethernet.is_empty());
    }

    #[test]
    fn test_rule_budget() {
        assert_eq!(GroupChainer::new(Some(1), false).rule_budget(10), 9);
        assert_eq!(GroupChainer::new(Some(0), false).rule_budget(10), 10);
        assert_eq!(GroupChainer::new(Some(1), false).rule_budget(0), 0);
    }
}
