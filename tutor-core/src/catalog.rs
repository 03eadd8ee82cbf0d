//! Static topic catalog.
//!
//! Each topic lists what a student at a given grade is expected to know and
//! the order in which its concepts usually build on each other. The catalog
//! is read-only for the life of the process.

use serde::Serialize;

/// Grade used when a topic has no expectations for the student's grade.
pub const DEFAULT_GRADE: u8 = 7;

/// A subject area the tutor can teach.
#[derive(Debug, Serialize)]
pub struct Topic {
    /// Unique slug, e.g. `solar-system`.
    pub key: &'static str,
    pub display_name: &'static str,
    /// Expectations keyed by grade level.
    pub grade_expectations: &'static [(u8, &'static [&'static str])],
    /// Concepts in teaching order.
    pub progression_path: &'static [&'static str],
}

impl Topic {
    /// Expectations for `grade`, falling back to [`DEFAULT_GRADE`] and then
    /// to the lowest grade the topic lists.
    pub fn expectations_for(&self, grade: u8) -> &'static [&'static str] {
        let lookup = |g: u8| {
            self.grade_expectations
                .iter()
                .find(|(level, _)| *level == g)
                .map(|(_, list)| *list)
        };

        lookup(grade)
            .or_else(|| lookup(DEFAULT_GRADE))
            .or_else(|| {
                self.grade_expectations
                    .iter()
                    .min_by_key(|(level, _)| *level)
                    .map(|(_, list)| *list)
            })
            .unwrap_or(&[])
    }

    /// Grades with explicit expectations, ascending.
    pub fn grades(&self) -> Vec<u8> {
        let mut grades: Vec<u8> = self.grade_expectations.iter().map(|(g, _)| *g).collect();
        grades.sort_unstable();
        grades
    }
}

static TOPICS: &[Topic] = &[
    Topic {
        key: "solar-system",
        display_name: "The Solar System",
        grade_expectations: &[
            (5, &[
                "Name the eight planets in order from the Sun",
                "Explain that planets orbit the Sun",
                "Tell the difference between a star, a planet and a moon",
            ]),
            (6, &[
                "Describe how gravity keeps planets and moons in orbit",
                "Compare inner rocky planets with outer gas giants",
                "Explain day and night using Earth's rotation",
            ]),
            (7, &[
                "Explain seasons using Earth's axial tilt",
                "Describe the phases of the Moon",
                "Relate a planet's distance from the Sun to its orbital period",
            ]),
            (8, &[
                "Use scale models to reason about distances in the solar system",
                "Explain eclipses using the positions of the Sun, Earth and Moon",
                "Describe how the solar system formed from a nebula",
            ]),
        ],
        progression_path: &[
            "planet order",
            "orbits",
            "gravity basics",
            "rotation and revolution",
            "seasons",
            "moon phases",
            "eclipses",
            "solar system formation",
        ],
    },
    Topic {
        key: "fractions",
        display_name: "Fractions",
        grade_expectations: &[
            (5, &[
                "Add and subtract fractions with unlike denominators",
                "Multiply a fraction by a whole number",
                "Interpret a fraction as division",
            ]),
            (6, &[
                "Divide fractions by fractions",
                "Convert between fractions, decimals and percents",
                "Solve word problems with mixed numbers",
            ]),
            (7, &[
                "Work with negative fractions",
                "Use fractions in ratios and unit rates",
                "Compute with complex fractions",
            ]),
        ],
        progression_path: &[
            "equivalent fractions",
            "common denominators",
            "adding fractions",
            "multiplying fractions",
            "dividing fractions",
            "fractions as decimals",
            "ratios and rates",
        ],
    },
    Topic {
        key: "photosynthesis",
        display_name: "Photosynthesis",
        grade_expectations: &[
            (6, &[
                "Identify the inputs and outputs of photosynthesis",
                "Explain why plants need sunlight",
                "Describe the role of leaves and chlorophyll",
            ]),
            (7, &[
                "Write the word equation for photosynthesis",
                "Explain how photosynthesis and respiration are linked",
                "Describe the role of stomata",
            ]),
            (9, &[
                "Distinguish light-dependent reactions from the Calvin cycle",
                "Explain limiting factors of photosynthesis",
                "Interpret experimental data on photosynthesis rates",
            ]),
        ],
        progression_path: &[
            "plant needs",
            "inputs and outputs",
            "chlorophyll",
            "word equation",
            "respiration link",
            "limiting factors",
            "light and dark reactions",
        ],
    },
    Topic {
        key: "ecosystems",
        display_name: "Ecosystems",
        grade_expectations: &[
            (5, &[
                "Describe producers, consumers and decomposers",
                "Build a simple food chain",
            ]),
            (7, &[
                "Trace energy through a food web",
                "Explain how a population change affects an ecosystem",
                "Describe the carbon cycle",
            ]),
            (8, &[
                "Explain energy pyramids and the ten percent rule",
                "Evaluate human impacts on biodiversity",
            ]),
        ],
        progression_path: &[
            "producers and consumers",
            "food chains",
            "food webs",
            "energy flow",
            "population balance",
            "nutrient cycles",
            "human impact",
        ],
    },
    Topic {
        key: "linear-equations",
        display_name: "Linear Equations",
        grade_expectations: &[
            (7, &[
                "Solve two-step equations",
                "Write an equation from a word problem",
            ]),
            (8, &[
                "Graph a line from slope and intercept",
                "Interpret slope as a rate of change",
                "Solve equations with variables on both sides",
            ]),
            (9, &[
                "Solve systems of linear equations",
                "Write the equation of a line through two points",
                "Model real situations with linear functions",
            ]),
        ],
        progression_path: &[
            "variables",
            "one-step equations",
            "two-step equations",
            "slope",
            "graphing lines",
            "slope-intercept form",
            "systems of equations",
        ],
    },
    Topic {
        key: "chemical-reactions",
        display_name: "Chemical Reactions",
        grade_expectations: &[
            (8, &[
                "Tell physical changes from chemical changes",
                "Describe signs that a reaction has happened",
                "Explain conservation of mass",
            ]),
            (9, &[
                "Balance simple chemical equations",
                "Classify synthesis, decomposition and combustion reactions",
            ]),
            (10, &[
                "Use moles to relate reactants and products",
                "Explain factors that change reaction rate",
                "Describe exothermic and endothermic reactions",
            ]),
        ],
        progression_path: &[
            "physical vs chemical change",
            "evidence of reactions",
            "conservation of mass",
            "balancing equations",
            "reaction types",
            "reaction rates",
            "energy in reactions",
        ],
    },
];

/// All topics in display order.
pub fn all() -> &'static [Topic] {
    TOPICS
}

/// Look up a topic by its slug (case-insensitive).
pub fn find(key: &str) -> Option<&'static Topic> {
    let key = key.trim();
    TOPICS.iter().find(|t| t.key.eq_ignore_ascii_case(key))
}
