use dictation_core::{CommandEditor, Document, Op, Rule, RuleTable, TextBuffer};
use pretty_assertions::assert_eq;

const NO_ARGS: [&str; 0] = [];

fn rules() -> RuleTable {
    RuleTable::new(vec![
        Rule::text("DELETE ME", "").unwrap(),
        Rule::text("old_word", "new_word").unwrap(),
        Rule::text("r2_old", "r2_new").unwrap(),
        Rule::command("s/(.*)/(.*)/", "", "replace", ["$1", "$2"]).unwrap(),
        Rule::command("connect (.*) and (.*)", "", "replace", ["$1 $2", "$1-$2"]).unwrap(),
        Rule::command("delete (.+)", "", "delete", ["$1"]).unwrap(),
        Rule::command("delete2 (.*)", "D2", "replace", ["$1", ""]).unwrap(),
        Rule::command("underscore (.*)", "", "replace", ["$1", "_$1_"]).unwrap(),
        Rule::command("select (.*)", "", "select", ["$1"]).unwrap(),
        Rule::command("selection_replace (.*)", "", "replaceSel", ["$1"]).unwrap(),
        Rule::command("selection_underscore", "", "replaceSel", ["_{}_"]).unwrap(),
        Rule::command("selection_quote", "", "replaceSel", ["\"{}\""]).unwrap(),
        Rule::command("selection_double", "", "replaceSel", ["{}{}"]).unwrap(),
        Rule::command("selection_inc", "", "incSel", NO_ARGS).unwrap(),
        Rule::command("selection_uc", "", "ucSel", NO_ARGS).unwrap(),
        Rule::command("step back", "", "goBackward", NO_ARGS).unwrap(),
        Rule::command(
            "prev_sent",
            "",
            "selectReBefore",
            ["[.?!]()[^.?!]+[.?!][^.?!]+"],
        )
        .unwrap(),
        Rule::command("code (\\d+)", "", "keyCode", ["$1"]).unwrap(),
        Rule::command("code letter (.)", "", "keyCodeStr", ["$1"]).unwrap(),
        Rule::command("undo (\\d+)", "", "undo", ["$1"]).unwrap(),
    ])
}

fn editor() -> CommandEditor<TextBuffer> {
    let mut editor = CommandEditor::new(TextBuffer::empty());
    editor.set_rules(rules());
    editor
}

fn add(editor: &mut CommandEditor<TextBuffer>, utterances: &[&str]) {
    for utterance in utterances {
        editor.commit_final(utterance);
    }
}

fn partial(editor: &mut CommandEditor<TextBuffer>, utterances: &[&str]) {
    for utterance in utterances {
        assert!(editor.commit_partial(utterance), "partial {utterance:?} rejected");
    }
}

fn text(editor: &CommandEditor<TextBuffer>) -> String {
    editor.document().to_string()
}

fn before_cursor(editor: &CommandEditor<TextBuffer>, n: usize) -> String {
    editor.document().text_before_cursor(n).unwrap()
}

#[test]
fn test_literal_rewrite_is_capitalized() {
    let mut editor = editor();
    add(&mut editor, &["old_word"]);
    assert_eq!(text(&editor), "New_word");

    let mut editor = self::editor();
    add(&mut editor, &["r2_old"]);
    assert_eq!(text(&editor), "R2_new");

    let mut editor = self::editor();
    add(&mut editor, &["test old_word test"]);
    assert_eq!(text(&editor), "Test new_word test");
}

#[test]
fn test_command_must_match_whole_utterance() {
    let mut editor = editor();
    add(&mut editor, &["I will delete something"]);
    assert_eq!(text(&editor), "I will delete something");
}

#[test]
fn test_replace_commands() {
    let mut editor = editor();
    add(&mut editor, &["test word1", "s/word1/word2/"]);
    assert_eq!(text(&editor), "Test word2");

    let mut editor = self::editor();
    add(&mut editor, &["test word1 word2", "connect word1 and word2"]);
    assert_eq!(text(&editor), "Test word1-word2");
}

#[test]
fn test_multi_utterance_command() {
    let mut editor = editor();
    add(&mut editor, &["test word1 word2", "connect word1", "and"]);
    assert_eq!(text(&editor), "Test word1 word2 connect word1 and");
    assert_eq!(
        editor.undo_stack().to_string(),
        "[delete 4, delete 14, delete 16]"
    );

    let result = editor.commit_final("word2");
    assert_eq!(result.to_string(), "+replace(word1 word2,word1-word2)");
    assert_eq!(editor.undo_stack().to_string(), "[restore 11, delete 16]");
    assert_eq!(text(&editor), "Test word1-word2");

    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "Test word1 word2");
}

#[test]
fn test_failed_multi_utterance_command_keeps_earlier_text_removed() {
    let mut editor = editor();
    add(&mut editor, &["test word1 word2", "connect word1", "and"]);
    let result = editor.commit_final("nonexisting_word");
    assert_eq!(
        result.to_string(),
        "-replace(word1 nonexisting_word,word1-nonexisting_word)"
    );
    assert_eq!(editor.undo_stack().to_string(), "[delete 16]");
    assert_eq!(text(&editor), "Test word1 word2");

    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "");
}

#[test]
fn test_failed_command_leaves_text_unchanged() {
    let mut editor = editor();
    add(&mut editor, &["there are word1 and word2..."]);
    let result = editor.commit_final("select nonexisting_word");
    assert!(!result.is_success());
    assert_eq!(text(&editor), "There are word1 and word2...");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "");

    let mut editor = self::editor();
    add(
        &mut editor,
        &["this is a text", "this is another text", "select nonexisting_word"],
    );
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "This is a text");

    let mut editor = self::editor();
    add(&mut editor, &["test word1 word2", "connect word1 and not_exist"]);
    assert_eq!(text(&editor), "Test word1 word2");
}

#[test]
fn test_command_with_replacement_text() {
    let mut editor = editor();
    add(&mut editor, &["this_is_a_text", "delete2 is_a"]);
    assert_eq!(text(&editor), "This__text D2");
    assert_eq!(
        editor.undo_stack().to_string(),
        "[restore 0, delete 3, delete 14]"
    );

    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "This_is_a_text D2");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "This_is_a_text");
}

#[test]
fn test_selection_commands() {
    let mut editor = editor();
    add(
        &mut editor,
        &["there are word1 and word2...", "select word1 and word2"],
    );
    editor.run(Op::GoToEnd).unwrap();
    assert_eq!(text(&editor), "There are word1 and word2...");

    let mut editor = self::editor();
    add(
        &mut editor,
        &[
            "there are word1 and word2...",
            "select word1 and word2",
            "selection_replace REPL",
        ],
    );
    assert_eq!(text(&editor), "There are REPL...");
    assert_eq!(
        editor.undo_stack().to_string(),
        "[restore 4, select, delete 28]"
    );
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "There are word1 and word2...");

    let mut editor = self::editor();
    add(
        &mut editor,
        &[
            "there are word1 and word2...",
            "select word1 and word2",
            "selection_underscore",
        ],
    );
    assert_eq!(text(&editor), "There are _word1 and word2_...");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "There are word1 and word2...");
}

#[test]
fn test_selection_double_on_single_letter() {
    let mut editor = editor();
    add(
        &mut editor,
        &["a", "select a", "selection_double", "selection_double"],
    );
    editor.run(Op::GoToEnd).unwrap();
    assert_eq!(before_cursor(&editor, 5), "AA");
}

#[test]
fn test_selection_case_and_quotes() {
    let mut editor = editor();
    add(
        &mut editor,
        &["this is some word", "select is some", "selection_uc"],
    );
    assert_eq!(text(&editor), "This IS SOME word");

    let mut editor = self::editor();
    add(
        &mut editor,
        &[
            "there are word1 and word2...",
            "select word1 and word2",
            "selection_uc",
        ],
    );
    assert_eq!(text(&editor), "There are WORD1 AND WORD2...");
    editor.run(Op::GoToEnd).unwrap();
    add(&mut editor, &["select word1 and word2", "selection_quote"]);
    assert_eq!(text(&editor), "There are \"WORD1 AND WORD2\"...");

    let mut editor = self::editor();
    add(
        &mut editor,
        &["this is SOME word", "select some", "selection_underscore"],
    );
    assert_eq!(text(&editor), "This is _SOME_ word");
}

#[test]
fn test_increment_selection() {
    let mut editor = editor();
    add(&mut editor, &["123456789", "select 3", "selection_inc"]);
    editor.run(Op::Move { delta: 3 }).unwrap();
    add(&mut editor, &["select 5", "selection_inc"]);
    assert_eq!(text(&editor), "124466789");
}

#[test]
fn test_select_all_then_replace() {
    let mut editor = editor();
    add(&mut editor, &["this is some word"]);
    editor.run(Op::SelectAll).unwrap();
    add(&mut editor, &["selection_replace REPL"]);
    assert_eq!(text(&editor), "REPL");
}

#[test]
fn test_dictating_over_selection() {
    let mut editor = editor();
    add(&mut editor, &["this is a text", "select is a", "is not a"]);
    assert_eq!(text(&editor), "This is not a text");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "This is a text");
    assert_eq!(editor.document().selected_text(), "is a");
}

#[test]
fn test_literal_over_selection_absorbed_by_next_utterance() {
    let mut editor = editor();
    add(
        &mut editor,
        &["this is a text", "select is a", "selection_replace"],
    );
    assert_eq!(text(&editor), "This selection_replace text");
    assert_eq!(
        editor.undo_stack().to_string(),
        "[restore 17, select, delete 14]"
    );

    add(&mut editor, &["is not a"]);
    assert_eq!(text(&editor), "This is not a text");
    assert_eq!(
        editor.undo_stack().to_string(),
        "[restore 8, select, delete 14]"
    );

    editor.undo(1).unwrap();
    assert_eq!(editor.undo_stack().to_string(), "[select, delete 14]");
    assert_eq!(text(&editor), "This is a text");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "This is a text");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "");
}

#[test]
fn test_delete_left_word_deletes_selection() {
    let mut editor = editor();
    add(&mut editor, &["1234567890", "select 456"]);
    editor.run(Op::DeleteLeftWord { max_context: 100 }).unwrap();
    assert_eq!(text(&editor), "1237890");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "1234567890");
}

#[test]
fn test_delete_left_word_and_delete() {
    let mut editor = editor();
    add(&mut editor, &["start12345 67890"]);
    assert_eq!(text(&editor), "Start12345 67890");
    editor
        .execute("deleteLeftWord", &[])
        .unwrap();
    assert_eq!(text(&editor), "Start12345");
    editor.execute("delete", &["12345".to_string()]).unwrap();
    assert_eq!(text(&editor), "Start");

    let mut editor = self::editor();
    add(&mut editor, &["a12345 67890_12345", "select 12345"]);
    assert_eq!(before_cursor(&editor, 2), "0_");
    editor.execute("deleteLeftWord", &[]).unwrap();
    assert_eq!(text(&editor), "A12345 67890_");
    editor.execute("deleteLeftWord", &[]).unwrap();
    assert_eq!(text(&editor), "A12345");
}

#[test]
fn test_replace_and_positions() {
    let mut editor = editor();
    add(&mut editor, &["a12345 67890_12345"]);
    editor
        .run(Op::Replace {
            query: "12345".to_string(),
            replacement: "abcdef".to_string(),
        })
        .unwrap();
    editor
        .run(Op::ReplaceSelection {
            template: " ".to_string(),
        })
        .unwrap();
    editor
        .run(Op::Replace {
            query: "12345".to_string(),
            replacement: "ABC".to_string(),
        })
        .unwrap();
    assert_eq!(before_cursor(&editor, 2), "BC");
    editor
        .run(Op::ReplaceSelection {
            template: "\n".to_string(),
        })
        .unwrap();
    editor
        .run(Op::ReplaceSelection {
            template: " ".to_string(),
        })
        .unwrap();
    editor.run(Op::GoToPosition { pos: 9 }).unwrap();
    assert_eq!(before_cursor(&editor, 2), "67");
}

#[test]
fn test_go_to_position_then_dictate() {
    let mut editor = editor();
    partial(&mut editor, &["...123", "...124"]);
    add(&mut editor, &["...1245"]);
    editor.run(Op::GoToPosition { pos: 4 }).unwrap();
    assert_eq!(before_cursor(&editor, 10), "...1");
    add(&mut editor, &["-"]);
    assert_eq!(text(&editor), "...1-245");
    add(&mut editor, &["undo 2", "-"]);
    assert_eq!(text(&editor), "...1245-");
}

#[test]
fn test_space_then_word_then_delete_all() {
    let mut editor = editor();
    add(&mut editor, &["test word1"]);
    editor
        .run(Op::ReplaceSelection {
            template: " ".to_string(),
        })
        .unwrap();
    add(&mut editor, &["word2"]);
    assert_eq!(text(&editor), "Test word1 word2");
    assert_eq!(before_cursor(&editor, 11), "word1 word2");
    add(&mut editor, &["connect word1 and word2"]);
    assert_eq!(text(&editor), "Test word1-word2");
    editor.execute("deleteAll", &[]).unwrap();
    assert_eq!(before_cursor(&editor, 1), "");
}

#[test]
fn test_partial_then_command() {
    let mut editor = editor();
    add(&mut editor, &["test word1 word2"]);
    assert!(editor.commit_partial("connect word1 and word2"));
    add(&mut editor, &["connect word1 and word2"]);
    assert_eq!(text(&editor), "Test word1-word2");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "Test word1 word2");
}

#[test]
fn test_selection_blocks_partials_but_not_commands() {
    let mut editor = editor();
    add(&mut editor, &["test word1 word2 word3", "select word3"]);
    assert_eq!(text(&editor), "Test word1 word2 word3");
    assert!(!editor.commit_partial("connect word1 and word2"));
    add(&mut editor, &["connect word1 and word2"]);
    assert_eq!(text(&editor), "Test word1-word2 word3");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "Test word1 word2 word3");
}

#[test]
fn test_partials_do_not_affect_command() {
    let mut editor = editor();
    add(&mut editor, &["test word1", "."]);
    partial(&mut editor, &["s/word1"]);
    assert_eq!(text(&editor), "Test word1. S/word1");
    partial(&mut editor, &["s/word1/word2/"]);
    add(&mut editor, &["s/word1/word2/"]);
    assert_eq!(text(&editor), "Test word2.");
}

#[test]
fn test_sentence_capitalization() {
    let mut editor = editor();
    add(&mut editor, &["sentence", ".", "sentence"]);
    assert_eq!(text(&editor), "Sentence. Sentence");

    let mut editor = self::editor();
    add(&mut editor, &["Sentence", "."]);
    partial(&mut editor, &["DELETE"]);
    assert_eq!(text(&editor), "Sentence. DELETE");
    add(&mut editor, &["DELETE ME"]);
    assert_eq!(text(&editor), "Sentence.");
}

#[test]
fn test_capitalization_across_partials() {
    let mut editor = editor();
    partial(&mut editor, &["this is 1st test."]);
    add(&mut editor, &["this is 1st test. this is 2nd test."]);
    partial(&mut editor, &["this is 3rd"]);
    add(&mut editor, &["this is 3rd test."]);
    assert_eq!(
        text(&editor),
        "This is 1st test. This is 2nd test. This is 3rd test."
    );

    add(&mut editor, &["delete this"]);
    assert_eq!(
        text(&editor),
        "This is 1st test. This is 2nd test.  is 3rd test."
    );
    editor.undo(1).unwrap();
    assert_eq!(
        text(&editor),
        "This is 1st test. This is 2nd test. This is 3rd test."
    );
}

#[test]
fn test_undo_final_results() {
    let mut editor = editor();
    partial(&mut editor, &["this is 1st test."]);
    add(&mut editor, &["this is 1st test. This is 2nd test."]);
    partial(&mut editor, &["this is 3rd"]);
    add(&mut editor, &["this is 3rd test."]);
    assert_eq!(
        text(&editor),
        "This is 1st test. This is 2nd test. This is 3rd test."
    );
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "This is 1st test. This is 2nd test.");
    editor.undo(1).unwrap();
    assert_eq!(text(&editor), "");
}

#[test]
fn test_regex_selection() {
    let mut editor = editor();
    add(&mut editor, &["This is number 1. This is number 2."]);
    editor
        .execute("selectReBefore", &["number ".to_string()])
        .unwrap();
    add(&mut editor, &["#"]);
    assert_eq!(text(&editor), "This is number 1. This is #2.");

    let mut editor = self::editor();
    add(&mut editor, &["This is number 1. This is number 2."]);
    editor
        .execute("selectReBefore", &["(\\d+)\\.".to_string()])
        .unwrap();
    add(&mut editor, &["II"]);
    assert_eq!(text(&editor), "This is number 1. This is number II.");
}

#[test]
fn test_regex_selection_with_empty_group() {
    let mut editor = editor();
    add(
        &mut editor,
        &["This is number 1. This is number 2? This is", "prev_sent"],
    );
    add(&mut editor, &["yes,"]);
    assert_eq!(
        text(&editor),
        "This is number 1. Yes, This is number 2? This is"
    );
    add(&mut editor, &["undo 2"]);
    add(&mut editor, &["3"]);
    assert_eq!(text(&editor), "This is number 1. This is number 2? This is 3");
}

#[test]
fn test_key_codes() {
    let mut editor = editor();
    add(&mut editor, &["This is a test", "code 66"]);
    assert_eq!(text(&editor), "This is a test\n");
    editor.execute("keyCodeStr", &["A".to_string()]).unwrap();
    assert_eq!(text(&editor), "This is a test\nA");

    let mut editor = self::editor();
    add(&mut editor, &["This is a test", "code letter B"]);
    assert_eq!(text(&editor), "This is a testB");
}
