//! Stream plumbing between pipeline stages.

use crate::io_adapters::{InputEnd, OutputEnd, StageEndpoints};
use std::io;

/// Assigns standard streams to each of `stage_count` stages.
///
/// A single stage shares all three streams with the interpreter. For longer
/// pipelines one anonymous pipe is allocated per adjacent pair of stages:
/// stage 0 reads from the null device, stage *i* writes into link *i* and the
/// next stage reads from it, and the terminal stage writes into a capture
/// buffer. Every stage keeps the interpreter's standard error.
pub fn wire(stage_count: usize) -> io::Result<Vec<StageEndpoints>> {
    if stage_count <= 1 {
        return Ok(vec![StageEndpoints::inherited()]);
    }

    let mut endpoints = Vec::with_capacity(stage_count);
    let mut upstream = None;
    for index in 0..stage_count {
        let stdin = match upstream.take() {
            Some(reader) => InputEnd::Link(reader),
            None => InputEnd::Null,
        };
        let stdout = if index + 1 == stage_count {
            OutputEnd::Capture
        } else {
            let (reader, writer) = io::pipe()?;
            upstream = Some(reader);
            OutputEnd::Link(writer)
        };
        endpoints.push(StageEndpoints {
            stdin,
            stdout,
            stderr: OutputEnd::Inherit,
        });
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_single_stage_inherits_everything() {
        let endpoints = wire(1).unwrap();
        assert_eq!(endpoints.len(), 1);
        assert!(matches!(endpoints[0].stdin, InputEnd::Inherit));
        assert!(matches!(endpoints[0].stdout, OutputEnd::Inherit));
        assert!(matches!(endpoints[0].stderr, OutputEnd::Inherit));
    }

    #[test]
    fn test_three_stage_shape() {
        let endpoints = wire(3).unwrap();
        assert_eq!(endpoints.len(), 3);

        assert!(matches!(endpoints[0].stdin, InputEnd::Null));
        assert!(matches!(endpoints[0].stdout, OutputEnd::Link(_)));

        assert!(matches!(endpoints[1].stdin, InputEnd::Link(_)));
        assert!(matches!(endpoints[1].stdout, OutputEnd::Link(_)));

        assert!(matches!(endpoints[2].stdin, InputEnd::Link(_)));
        assert!(endpoints[2].stdout.is_capture());

        for stage in &endpoints {
            assert!(matches!(stage.stderr, OutputEnd::Inherit));
        }
    }

    #[test]
    fn test_links_connect_adjacent_stages() {
        let mut endpoints = wire(2).unwrap().into_iter();
        let producer = endpoints.next().unwrap();
        let consumer = endpoints.next().unwrap();

        let OutputEnd::Link(mut writer) = producer.stdout else {
            panic!("stage 0 should write into a link");
        };
        let InputEnd::Link(mut reader) = consumer.stdin else {
            panic!("stage 1 should read from a link");
        };

        writer.write_all(b"through the pipe").unwrap();
        drop(writer);

        let mut received = String::new();
        reader.read_to_string(&mut received).unwrap();
        assert_eq!(received, "through the pipe");
    }
}
