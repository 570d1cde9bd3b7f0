//! Property-based tests for formatting composition, item serialization
//! and level filtering.

use chrono::DateTime;
use logline_core::format::components::{level, line, message, module, thread};
use logline_core::format::{Formatting, FormattingBuilder};
use logline_core::{
    formatting, FormatError, JsonLogItemFormatter, Level, Location, LogItem, LogItemFormatter,
};
use proptest::prelude::*;

// ============================================================================
// Strategy Generators
// ============================================================================

fn level_strategy() -> impl Strategy<Value = Level> {
    (0u8..5).prop_map(|raw| Level::try_from(raw).unwrap())
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 |:\\[\\]]{0,20}").expect("valid regex")
}

fn item_strategy() -> impl Strategy<Value = LogItem> {
    (
        0i64..4_102_444_800,
        0u32..1_000_000_000,
        prop::option::of("[a-z]{1,10}"),
        level_strategy(),
        ".{0,200}",
        "[a-z/]{1,30}\\.rs",
        "[a-z_]{0,20}",
        any::<u32>(),
        ".{0,20}",
    )
        .prop_map(
            |(secs, nanos, module, level, message, file, function, line, thread)| {
                LogItem::from_parts(
                    DateTime::from_timestamp(secs, nanos).unwrap(),
                    module,
                    level,
                    message,
                    file,
                    function,
                    line,
                    thread,
                )
            },
        )
}

/// A formatting rule, kept as data so failing cases print readably.
#[derive(Debug, Clone)]
enum Rule {
    Text(String),
    Message,
    Thread,
    Level,
    Module,
    Line,
    /// Fails for warnings and errors, writes nothing otherwise
    FailSevere,
}

impl Rule {
    fn witness(&self) -> Formatting<String> {
        match self {
            Rule::Text(text) => Formatting::from(text.as_str()),
            Rule::Message => message(),
            Rule::Thread => thread(),
            Rule::Level => level(),
            Rule::Module => module("-"),
            Rule::Line => line(),
            Rule::FailSevere => Formatting::try_property(|item: &LogItem| {
                if item.level() >= Level::Warning {
                    Err(FormatError::Transform("severe".into()))
                } else {
                    Ok(String::new())
                }
            }),
        }
    }
}

fn rule_strategy() -> impl Strategy<Value = Rule> {
    prop_oneof![
        text_strategy().prop_map(Rule::Text),
        Just(Rule::Message),
        Just(Rule::Thread),
        Just(Rule::Level),
        Just(Rule::Module),
        Just(Rule::Line),
        Just(Rule::FailSevere),
    ]
}

fn items_strategy() -> impl Strategy<Value = Vec<LogItem>> {
    prop::collection::vec(item_strategy(), 1..8)
}

/// Formatting result with the error flattened for comparison.
fn outcome(witness: &Formatting<String>, item: &LogItem) -> Result<String, String> {
    witness.format_item(item).map_err(|e| e.to_string())
}

fn item() -> LogItem {
    LogItem::new(Level::Info, "body", Location::new("lib.rs", "run", 7))
}

fn render(witness: &Formatting<String>) -> String {
    witness.format_item(&item()).unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Concatenation is associative for any rules and items
    #[test]
    fn concat_is_associative_for_any_rules(
        a in rule_strategy(),
        b in rule_strategy(),
        c in rule_strategy(),
        items in items_strategy(),
    ) {
        let (fa, fb, fc) = (a.witness(), b.witness(), c.witness());
        let left = (fa.clone() + fb.clone()) + fc.clone();
        let right = fa + (fb + fc);

        for item in &items {
            prop_assert_eq!(outcome(&left, item), outcome(&right, item));
        }
    }

    /// The empty witness is a left and right identity for any rule
    #[test]
    fn empty_is_identity_for_any_rule(rule in rule_strategy(), items in items_strategy()) {
        let witness = rule.witness();
        let left = Formatting::empty() + witness.clone();
        let right = witness.clone() + Formatting::empty();

        for item in &items {
            prop_assert_eq!(outcome(&left, item), outcome(&witness, item));
            prop_assert_eq!(outcome(&right, item), outcome(&witness, item));
        }
    }

    /// A sequence writes each part in order and fails as a whole when any
    /// part fails
    #[test]
    fn sequence_matches_parts(rules in prop::collection::vec(rule_strategy(), 0..6), items in items_strategy()) {
        let witness: Formatting<String> = rules.iter().map(Rule::witness).collect();

        for item in &items {
            let expected = rules
                .iter()
                .map(|rule| outcome(&rule.witness(), item))
                .collect::<Result<String, String>>();
            prop_assert_eq!(outcome(&witness, item), expected);
        }
    }

    /// Concatenation of constants is their string concatenation
    #[test]
    fn concat_of_constants(a in text_strategy(), b in text_strategy(), c in text_strategy()) {
        let (fa, fb, fc) = (
            Formatting::from(a.as_str()),
            Formatting::from(b.as_str()),
            Formatting::from(c.as_str()),
        );
        let witness = fa + fb + fc;

        prop_assert_eq!(render(&witness), format!("{}{}{}", a, b, c));
    }

    /// The builder emits parts in declaration order, skipping absent ones
    #[test]
    fn builder_preserves_order(parts in prop::collection::vec(prop::option::of(text_strategy()), 0..12)) {
        let mut builder = FormattingBuilder::<String>::new();
        for part in &parts {
            builder = builder.push_opt(part.as_deref());
        }

        let expected: String = parts.iter().flatten().cloned().collect();
        prop_assert_eq!(render(&builder.build()), expected);
    }

    /// Either contributes exactly one branch
    #[test]
    fn either_picks_one_branch(condition in any::<bool>(), a in text_strategy(), b in text_strategy()) {
        let witness: Formatting<String> = FormattingBuilder::new()
            .push("<")
            .push_if(condition, a.as_str(), b.as_str())
            .push(">")
            .build();

        let chosen = if condition { &a } else { &b };
        prop_assert_eq!(render(&witness), format!("<{}>", chosen));
    }

    /// Any item survives JSON encoding
    #[test]
    fn json_roundtrip(item in item_strategy()) {
        let formatter = JsonLogItemFormatter::new();
        let bytes = formatter.format(&item).unwrap();

        prop_assert!(!bytes.contains(&b'\n'));
        prop_assert_eq!(formatter.decode(&bytes).unwrap(), item);
    }

    /// An item passes a floor exactly when it is at least as severe
    #[test]
    fn level_floor_is_inclusive(level in level_strategy(), min_level in level_strategy()) {
        prop_assert_eq!(level.passes(min_level), u8::from(level) >= u8::from(min_level));
    }
}

#[test]
fn test_macro_matches_builder() {
    let from_macro: Formatting<String> = formatting!["[", message(), "]"];
    let from_builder = FormattingBuilder::new().push("[").push(message()).push("]").build();

    assert_eq!(render(&from_macro), "[body]");
    assert_eq!(render(&from_macro), render(&from_builder));
}
