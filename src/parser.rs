//! Tokenizer turning one input line into a [`Pipeline`].
//!
//! The grammar is deliberately tiny: the line is cut on every `|` into stages,
//! and each stage is cut on runs of whitespace into tokens. Nothing is quoted
//! or escaped, so a `|` is always a stage separator.

use crate::command::{Command, Pipeline};

/// Separator between pipeline stages.
pub const PIPE: char = '|';

/// Splits `line` into pipeline stages and whitespace-delimited tokens.
///
/// Empty segments are preserved as empty commands, so `a || b` yields three
/// stages with an empty one in the middle, and a blank line yields a single
/// empty command.
pub fn parse_line(line: &str) -> Pipeline {
    let stages = line.split(PIPE).map(parse_stage).collect();
    Pipeline::new(stages)
}

fn parse_stage(segment: &str) -> Command {
    Command::new(segment.split_whitespace().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pipeline: &Pipeline) -> Vec<Vec<&str>> {
        pipeline
            .stages()
            .iter()
            .map(|c| c.tokens().iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_single_command_with_args() {
        let pipeline = parse_line("ls -la /tmp\n");
        assert_eq!(tokens(&pipeline), vec![vec!["ls", "-la", "/tmp"]]);
        assert!(pipeline.is_single());
    }

    #[test]
    fn test_blank_lines_yield_single_empty_command() {
        for line in ["", "\n", "   ", " \t \n"] {
            let pipeline = parse_line(line);
            assert!(pipeline.is_blank(), "line {line:?} should be blank");
        }
    }

    #[test]
    fn test_pipeline_stages_in_order() {
        let pipeline = parse_line("cat file.txt | grep foo |wc -l");
        assert_eq!(
            tokens(&pipeline),
            vec![vec!["cat", "file.txt"], vec!["grep", "foo"], vec!["wc", "-l"]]
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let pipeline = parse_line("  echo \t  a   b  ");
        assert_eq!(tokens(&pipeline), vec![vec!["echo", "a", "b"]]);
    }

    #[test]
    fn test_empty_segments_are_preserved() {
        let pipeline = parse_line("a || b");
        assert_eq!(tokens(&pipeline), vec![vec!["a"], vec![], vec!["b"]]);

        let leading = parse_line("| wc");
        assert_eq!(tokens(&leading), vec![vec![], vec!["wc"]]);
        assert!(!leading.is_blank());
    }

    #[test]
    fn test_quotes_are_not_interpreted() {
        let pipeline = parse_line("echo \"a|b\"");
        assert_eq!(tokens(&pipeline), vec![vec!["echo", "\"a"], vec!["b\""]]);
    }
}
