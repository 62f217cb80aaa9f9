use markdown_script::{transform_markdown, Transformer};
use proptest::prelude::*;

fn markdown_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ \t]{0,5}(`{2,22}|~{2,22})[a-zA-Z ]{0,8}",
        "[ \t]{0,4}[a-z#*-]{0,12}",
        Just(String::new()),
        ".{0,16}",
    ]
}

fn markdown_document() -> impl Strategy<Value = String> {
    prop::collection::vec(markdown_line(), 0..24).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn never_panics_and_keeps_line_count(input in markdown_document()) {
        let lines = Transformer::default().transform_lines(&input);
        prop_assert_eq!(lines.len(), input.split('\n').count());
    }

    #[test]
    fn handles_arbitrary_text(input in any::<String>()) {
        let _ = transform_markdown(&input);
    }

    #[test]
    fn closer_needs_at_least_the_opening_run(
        open in 3usize..=20,
        close in 1usize..=24,
        indent in 0usize..=3,
        tilde in any::<bool>(),
    ) {
        let fence = if tilde { "~" } else { "`" };
        let input = format!(
            "{}js\nbody\n{}{}\t \nafter",
            fence.repeat(open),
            " ".repeat(indent),
            fence.repeat(close),
        );
        let lines = Transformer::default().transform_lines(&input);

        if close >= open {
            prop_assert_eq!(lines, vec!["", "body", "", "// after"]);
        } else {
            let expected_closer = format!("{}{}\t ", " ".repeat(indent), fence.repeat(close));
            prop_assert_eq!(lines, vec![
                String::new(),
                "body".to_string(),
                expected_closer,
                "after".to_string(),
            ]);
        }
    }
}
