//! Evolution detection: paired-tool combinations drawn in one raid round.

use lazy_static::lazy_static;

lazy_static! {
    /// Recipe table: evolved name paired with its two required tools.
    ///
    /// Iteration order is the tie-break; the first matching recipe wins.
    /// Recipes are assumed non-overlapping in practice.
    pub static ref EVOLUTION_RECIPES: Vec<(&'static str, (&'static str, &'static str))> = vec![
        ("full power gorb", ("the gorb", "the necromancers skull")),
        ("psychosis", ("voice to skull", "alexs pure lsd")),
        (
            "indescribable wealth",
            (
                "gerder gumpsneeds guaranteed jackpot method",
                "luck of the irish",
            ),
        ),
        (
            "planetary annihilation",
            ("spindablocks storage", "liquid tiberium bomb"),
        ),
        ("wok fortress", ("loan from chinese mike", "wok28")),
        ("holy pact", ("tome of divine knowledge", "the gorb")),
        ("dark pact", ("tome of irreverent knowledge", "the gorb")),
        ("dads shotgun", ("dads gun", "moms purse")),
        (
            "ultimate brain freeze",
            ("wok ki ki energy vortex", "coke flavored slurpee"),
        ),
        (
            "avatar of the wok ki ki guardian",
            (
                "wok ki ki energy vortex",
                "ancient slapahoe peace pipe of good fortune and fruit",
            ),
        ),
        (
            "thugnars modified glock",
            ("thugnars glock", "the prollum solva"),
        ),
        (
            "infinite omnipotent awareness",
            ("tome of divine knowledge", "tome of irreverent knowledge"),
        ),
        ("alexbot militia", ("convoy", "backup")),
        ("20 ton discount", ("10 finger discount", "titanium pimp hand")),
    ];
}

/// A triggered evolution: the evolved tool and its two ingredients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evolution {
    pub evolved: String,
    pub first: String,
    pub second: String,
}

/// Scan the tools drawn this round for a recipe whose both ingredients are
/// present. Returns the first match in table order, or `None`.
pub fn check_evolution<S: AsRef<str>>(drawn_tools: &[S]) -> Option<Evolution> {
    let present = |name: &str| drawn_tools.iter().any(|tool| tool.as_ref() == name);

    EVOLUTION_RECIPES
        .iter()
        .find(|(_, (first, second))| present(first) && present(second))
        .map(|(evolved, (first, second))| Evolution {
            evolved: evolved.to_string(),
            first: first.to_string(),
            second: second.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_present_triggers() {
        let drawn = ["the gorb", "the necromancers skull", "unrelated"];
        let evolution = check_evolution(&drawn).expect("should trigger");
        assert_eq!(evolution.evolved, "full power gorb");
        assert_eq!(evolution.first, "the gorb");
        assert_eq!(evolution.second, "the necromancers skull");
    }

    #[test]
    fn test_single_ingredient_does_not_trigger() {
        assert!(check_evolution(&["the gorb"]).is_none());
        assert!(check_evolution::<&str>(&[]).is_none());
    }

    #[test]
    fn test_order_of_drawn_tools_irrelevant() {
        let drawn = ["wok28", "loan from chinese mike"];
        let evolution = check_evolution(&drawn).expect("should trigger");
        assert_eq!(evolution.evolved, "wok fortress");
    }

    #[test]
    fn test_first_recipe_in_table_order_wins() {
        // "the gorb" appears in three recipes; with the skull also present
        // the earliest table entry takes precedence.
        let drawn = ["tome of divine knowledge", "the gorb", "the necromancers skull"];
        let evolution = check_evolution(&drawn).expect("should trigger");
        assert_eq!(evolution.evolved, "full power gorb");
    }
}
