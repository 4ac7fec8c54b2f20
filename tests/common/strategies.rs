use beanstalk_check::SelectorToken;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for generating valid tube names
pub fn tube_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

/// Strategy for generating server tube listings
pub fn tube_set_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(tube_name_strategy(), 0..12)
}

/// Strategy for generating literal or pattern selectors, optionally negated
pub fn selector_strategy() -> impl Strategy<Value = SelectorToken> {
    (
        any::<bool>(),
        any::<bool>(),
        prop_oneof![tube_name_strategy(), "[a-z]{1,3}"],
    )
        .prop_map(|(negate, is_pattern, body)| {
            let token = if is_pattern {
                // Lowercase alphanumerics are always a valid regex
                SelectorToken::pattern(body).expect("alphanumeric pattern compiles")
            } else {
                SelectorToken::literal(body)
            };
            if negate {
                token.negated()
            } else {
                token
            }
        })
}

/// Strategy for generating ordered selector lists
pub fn selector_list_strategy() -> impl Strategy<Value = Vec<SelectorToken>> {
    prop::collection::vec(selector_strategy(), 0..6)
}
