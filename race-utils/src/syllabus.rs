//! The fixed syllabus every player races through.
//!
//! Both the server and the client compile this in, so the layout of the
//! completion vector is never sent over the wire.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    pub name: &'static str,
    pub units: usize,
}

pub const SUBJECTS: &[Subject] = &[
    Subject {
        name: "Data Structures",
        units: 5,
    },
    Subject {
        name: "COA",
        units: 5,
    },
    Subject {
        name: "Digital Electronics",
        units: 5,
    },
    Subject {
        name: "DSTL",
        units: 5,
    },
    Subject {
        name: "Technical Communication",
        units: 5,
    },
    Subject {
        name: "Cyber Security",
        units: 5,
    },
];

/// Length of every completion vector: the units of all subjects, flattened.
pub const TOTAL_UNITS: usize = {
    let mut total = 0;
    let mut i = 0;
    while i < SUBJECTS.len() {
        total += SUBJECTS[i].units;
        i += 1;
    }
    total
};

/// Flattened index of `unit` (1-based) within the subject at `subject`.
pub fn unit_index(subject: usize, unit: usize) -> Option<usize> {
    let target = SUBJECTS.get(subject)?;
    if unit == 0 || unit > target.units {
        return None;
    }
    let offset: usize = SUBJECTS[..subject].iter().map(|s| s.units).sum();
    Some(offset + unit - 1)
}

/// Inverse of [`unit_index`]: the subject owning `index` and the 1-based unit
/// number inside it.
pub fn locate_unit(index: usize) -> Option<(&'static Subject, usize)> {
    let mut offset = 0;
    for subject in SUBJECTS {
        if index < offset + subject.units {
            return Some((subject, index - offset + 1));
        }
        offset += subject.units;
    }
    None
}
