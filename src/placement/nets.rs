//! Net remapping between a room and one scope instance on the target board

use std::collections::BTreeMap;

use tracing::debug;

use crate::board::{Footprint, NetCode, NetRegistry, Pad};

/// A template net that was already mapped when a different target net showed up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetConflict {
    pub template: NetCode,
    pub kept: NetCode,
    pub rejected: NetCode,
}

/// Template net code to target net code, for one scope instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetMapping {
    map: BTreeMap<NetCode, NetCode>,
}

impl NetMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `template` corresponds to `target`.
    ///
    /// The first mapping for a template net wins. Unconnected nets on either
    /// side are ignored.
    pub fn insert(&mut self, template: NetCode, target: NetCode) -> Result<(), NetConflict> {
        if template.is_none() || target.is_none() {
            return Ok(());
        }
        match self.map.get(&template) {
            Some(kept) if *kept != target => Err(NetConflict {
                template,
                kept: *kept,
                rejected: target,
            }),
            Some(_) => Ok(()),
            None => {
                self.map.insert(template, target);
                Ok(())
            }
        }
    }

    /// Learn the nets of corresponding pads.
    ///
    /// Pads pair up by pad number when the template pad has one, otherwise by
    /// their position in the pad list.
    pub fn add_pads(&mut self, template: &Footprint, target: &Footprint) -> Vec<NetConflict> {
        let mut conflicts = Vec::new();
        for (index, pad) in template.pads.iter().enumerate() {
            let Some(counterpart) = corresponding_pad(pad, index, &target.pads) else {
                debug!(
                    reference = %target.reference,
                    pad = %pad.number,
                    "no corresponding pad on target"
                );
                continue;
            };
            if let Err(conflict) = self.insert(pad.net, counterpart.net) {
                conflicts.push(conflict);
            }
        }
        conflicts
    }

    /// Map still-unmapped global template nets to target nets of the same name.
    ///
    /// Returns how many nets were added.
    pub fn match_global_nets(&mut self, template: &NetRegistry, target: &NetRegistry) -> usize {
        let mut added = 0;
        for net in template.iter().filter(|n| n.is_global()) {
            if self.map.contains_key(&net.code) {
                continue;
            }
            if let Some(code) = target.find(&net.name) {
                if self.insert(net.code, code).is_ok() && !code.is_none() {
                    added += 1;
                }
            }
        }
        added
    }

    /// Target net for a template net, or no net when unknown
    pub fn get(&self, template: NetCode) -> NetCode {
        self.map.get(&template).copied().unwrap_or(NetCode::NONE)
    }

    pub fn contains(&self, template: NetCode) -> bool {
        self.map.contains_key(&template)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn corresponding_pad<'a>(pad: &Pad, index: usize, pads: &'a [Pad]) -> Option<&'a Pad> {
    if pad.number.is_empty() {
        return pads.get(index);
    }
    pads.iter().find(|p| p.number == pad.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Net, Point};

    fn footprint(pads: &[(&str, u32)]) -> Footprint {
        let mut fp = Footprint::new("U1", Point::new(0, 0));
        fp.pads = pads
            .iter()
            .map(|(number, net)| Pad::new(*number, NetCode(*net)))
            .collect();
        fp
    }

    fn registry(nets: &[(u32, &str)]) -> NetRegistry {
        let nets: Vec<Net> = nets
            .iter()
            .map(|(code, name)| Net {
                code: NetCode(*code),
                name: name.to_string(),
            })
            .collect();
        serde_json::from_value(serde_json::to_value(nets).unwrap()).unwrap()
    }

    #[test]
    fn test_pads_match_by_number_not_order() {
        let template = footprint(&[("1", 10), ("2", 11)]);
        let target = footprint(&[("2", 21), ("1", 20)]);
        let mut mapping = NetMapping::new();

        assert!(mapping.add_pads(&template, &target).is_empty());
        assert_eq!(mapping.get(NetCode(10)), NetCode(20));
        assert_eq!(mapping.get(NetCode(11)), NetCode(21));
    }

    #[test]
    fn test_unnumbered_pads_match_by_order() {
        let template = footprint(&[("", 10), ("", 11)]);
        let target = footprint(&[("", 20)]);
        let mut mapping = NetMapping::new();

        mapping.add_pads(&template, &target);
        assert_eq!(mapping.get(NetCode(10)), NetCode(20));
        assert_eq!(mapping.get(NetCode(11)), NetCode::NONE);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_first_mapping_wins() {
        let mut mapping = NetMapping::new();
        assert!(mapping.insert(NetCode(1), NetCode(5)).is_ok());
        assert!(mapping.insert(NetCode(1), NetCode(5)).is_ok());
        assert_eq!(
            mapping.insert(NetCode(1), NetCode(6)),
            Err(NetConflict {
                template: NetCode(1),
                kept: NetCode(5),
                rejected: NetCode(6),
            })
        );
        assert_eq!(mapping.get(NetCode(1)), NetCode(5));
    }

    #[test]
    fn test_no_net_is_never_mapped() {
        let mut mapping = NetMapping::new();
        mapping.insert(NetCode::NONE, NetCode(3)).unwrap();
        mapping.insert(NetCode(3), NetCode::NONE).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_global_nets_match_by_name() {
        let template = registry(&[(1, "GND"), (2, "/local"), (3, "VCC"), (4, "+5V")]);
        let target = registry(&[(7, "GND"), (8, "/amp1/local"), (9, "VCC")]);
        let mut mapping = NetMapping::new();
        mapping.insert(NetCode(3), NetCode(42)).unwrap();

        assert_eq!(mapping.match_global_nets(&template, &target), 1);
        assert_eq!(mapping.get(NetCode(1)), NetCode(7));
        assert_eq!(mapping.get(NetCode(2)), NetCode::NONE);
        // Pad correspondence takes precedence
        assert_eq!(mapping.get(NetCode(3)), NetCode(42));
        assert!(!mapping.contains(NetCode(4)));
    }
}
