use anyhow::Context;

use crate::config::DEFAULT_SLOTS;
use crate::models::TimeOfDay;

/// The clinic's fixed, ordered set of bookable start times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlotPolicy {
    slots: Vec<TimeOfDay>,
}

impl TimeSlotPolicy {
    /// Parses a comma-separated slot list such as `"09:30,14:00"`.
    pub fn from_list(list: &str) -> anyhow::Result<Self> {
        let mut slots = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| TimeOfDay::parse(s).with_context(|| format!("invalid clinic slot: {s:?}")))
            .collect::<anyhow::Result<Vec<_>>>()?;

        anyhow::ensure!(!slots.is_empty(), "clinic slot list is empty");

        slots.sort();
        slots.dedup();
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[TimeOfDay] {
        &self.slots
    }

    pub fn is_valid_slot(&self, time: &TimeOfDay) -> bool {
        self.slots.binary_search(time).is_ok()
    }

    /// Normalizes `raw` and keeps it only if it lands on a slot.
    pub fn slot(&self, raw: &str) -> Option<TimeOfDay> {
        TimeOfDay::parse(raw).filter(|t| self.is_valid_slot(t))
    }
}

impl Default for TimeSlotPolicy {
    fn default() -> Self {
        let slots = DEFAULT_SLOTS
            .split(',')
            .filter_map(TimeOfDay::parse)
            .collect();
        Self { slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_slots() {
        let policy = TimeSlotPolicy::default();
        let rendered: Vec<String> = policy.slots().iter().map(|t| t.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["09:30", "10:30", "11:30", "13:00", "14:00", "15:00", "16:00"]
        );
    }

    #[test]
    fn test_slot_membership() {
        let policy = TimeSlotPolicy::default();
        assert_eq!(policy.slot("14h").unwrap().to_string(), "14:00");
        assert_eq!(policy.slot("9h30").unwrap().to_string(), "09:30");
        assert!(policy.slot("09:00").is_none());
        assert!(policy.slot("17:30").is_none());
        assert!(policy.slot("12:00").is_none());
    }

    #[test]
    fn test_from_list_sorts_and_validates() {
        let policy = TimeSlotPolicy::from_list("16:00, 8h, 08:00").unwrap();
        let rendered: Vec<String> = policy.slots().iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["08:00", "16:00"]);

        assert!(TimeSlotPolicy::from_list("").is_err());
        assert!(TimeSlotPolicy::from_list("09:30,lunch").is_err());
    }
}
