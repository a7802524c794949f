use renpy_highlight::{
    CaptureStyleMapper, DocumentProcessor, FoldRegion, HighlightProcessor,
    HighlightProcessorConfig, ProcessingEdit, StyleLayerId, UpdateMode,
};

#[test]
fn test_processor_produces_highlights_and_folds_from_fixture() {
    let text = include_str!("fixtures/choices.rpy");

    let config = HighlightProcessorConfig::renpy().with_simple_capture_styles([
        ("keyword", 10),
        ("string", 11),
        ("embedded", 12),
    ]);

    let mut processor = HighlightProcessor::new(config).unwrap();
    let edits = processor.process(text, 1).unwrap();
    assert_eq!(processor.last_update_mode(), UpdateMode::Initial);

    let mut saw_style = false;
    let mut saw_folds = false;
    for edit in edits {
        match edit {
            ProcessingEdit::ReplaceStyleLayer { layer, intervals } => {
                assert_eq!(layer, StyleLayerId::TREE_SITTER);
                assert!(!intervals.is_empty());
                assert!(
                    intervals
                        .windows(2)
                        .all(|w| (w[0].start, w[0].end, w[0].style_id)
                            < (w[1].start, w[1].end, w[1].style_id)),
                    "intervals must be sorted and unique"
                );
                // `init` at the very start of the file.
                assert!(intervals.iter().any(|i| i.start == 0 && i.end == 4 && i.style_id == 10));
                assert!(intervals.iter().any(|i| i.style_id == 11));
                assert!(intervals.iter().any(|i| i.style_id == 12));

                let dynamic: Vec<_> = intervals
                    .iter()
                    .filter(|i| i.style_id & 0xFF00_0000 == CaptureStyleMapper::BASE)
                    .collect();
                assert!(!dynamic.is_empty());
                assert!(
                    dynamic
                        .iter()
                        .all(|i| processor.capture_name_for_style(i.style_id).is_some())
                );
                saw_style = true;
            }
            ProcessingEdit::ReplaceFoldingRegions {
                regions,
                preserve_collapsed,
            } => {
                assert!(preserve_collapsed);
                assert_eq!(
                    regions,
                    vec![
                        FoldRegion::new(0, 3),
                        FoldRegion::new(5, 16),
                        FoldRegion::new(7, 12),
                        FoldRegion::new(13, 14),
                        FoldRegion::new(15, 16),
                    ]
                );
                saw_folds = true;
            }
        }
    }

    assert!(saw_style);
    assert!(saw_folds);
}

#[test]
fn test_processor_reprocesses_on_new_version() {
    let mut config = HighlightProcessorConfig::renpy();
    config.set_preserve_collapsed_folds(false);
    let mut processor = HighlightProcessor::new(config).unwrap();

    processor.process("label a:\n    jump b\n", 1).unwrap();
    assert_eq!(processor.last_update_mode(), UpdateMode::Initial);

    let edits = processor.process("label a:\n    jump b\n", 1).unwrap();
    assert!(edits.is_empty());
    assert_eq!(processor.last_update_mode(), UpdateMode::Skipped);

    let edits = processor.process("label a:\n\n    jump b\n    jump c\n", 2).unwrap();
    assert_eq!(processor.last_update_mode(), UpdateMode::FullReparse);
    assert!(edits.contains(&ProcessingEdit::ReplaceFoldingRegions {
        regions: vec![FoldRegion::new(0, 3)],
        preserve_collapsed: false,
    }));
}

#[test]
fn test_processor_on_empty_document() {
    let mut processor = HighlightProcessor::new(HighlightProcessorConfig::renpy()).unwrap();
    let edits = processor.process("", 0).unwrap();
    assert_eq!(
        edits,
        vec![
            ProcessingEdit::ReplaceStyleLayer {
                layer: StyleLayerId::TREE_SITTER,
                intervals: Vec::new(),
            },
            ProcessingEdit::ReplaceFoldingRegions {
                regions: Vec::new(),
                preserve_collapsed: true,
            },
        ]
    );
}
