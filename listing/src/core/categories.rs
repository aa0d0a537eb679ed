//! Listing categories offered in the first wizard step.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub label: &'static str,
    pub description: &'static str,
}

pub const CATEGORIES: [Category; 15] = [
    Category {
        label: "Beach",
        description: "This property is close to the beach!",
    },
    Category {
        label: "Windmills",
        description: "This property has windmills!",
    },
    Category {
        label: "Modern",
        description: "This property is modern!",
    },
    Category {
        label: "Countryside",
        description: "This property is in the countryside!",
    },
    Category {
        label: "Pools",
        description: "This property has a pool!",
    },
    Category {
        label: "Islands",
        description: "This property is on an island!",
    },
    Category {
        label: "Lake",
        description: "This property is close to a lake!",
    },
    Category {
        label: "Skiing",
        description: "This property has skiing activities!",
    },
    Category {
        label: "Castles",
        description: "This property is in a castle!",
    },
    Category {
        label: "Caves",
        description: "This property is in a spooky cave!",
    },
    Category {
        label: "Camping",
        description: "This property offers camping activities!",
    },
    Category {
        label: "Arctic",
        description: "This property is in an arctic environment!",
    },
    Category {
        label: "Desert",
        description: "This property is in the desert!",
    },
    Category {
        label: "Barns",
        description: "This property is in a barn!",
    },
    Category {
        label: "Lux",
        description: "This property is brand new and luxurious!",
    },
];

pub fn find(label: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.label == label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_unique() {
        let labels: HashSet<&str> = CATEGORIES.iter().map(|c| c.label).collect();
        assert_eq!(labels.len(), CATEGORIES.len());
    }

    #[test]
    fn find_is_case_sensitive() {
        assert!(find("Beach").is_some());
        assert!(find("beach").is_none());
    }
}
