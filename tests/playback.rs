mod tests {
    use pixel_playback::{DroppedFrame, Frame, PlaybackBuffer, RenderOptions, Rgb};

    const NOW: u64 = 1_717_000_000_000;
    const TOLERANCE: u64 = 10;
    const STALE: u64 = 1000;

    fn frame(output_id: &str, timestamp: u64, marker: u8) -> Frame {
        Frame::new(
            output_id,
            timestamp,
            RenderOptions::empty(),
            vec![Rgb::new(marker, 0, 0)],
        )
    }

    fn markers(frames: &[Frame]) -> Vec<u8> {
        frames.iter().map(|frame| frame.samples[0].r).collect()
    }

    fn known(_: &str) -> bool {
        true
    }

    #[test]
    fn test_enqueue_orders_by_timestamp() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW + 300, 1)).unwrap();
        buffer.enqueue(frame("A", NOW + 100, 2)).unwrap();
        buffer.enqueue(frame("B", NOW + 200, 3)).unwrap();
        buffer.enqueue(frame("B", NOW + 100, 4)).unwrap();

        assert_eq!(buffer.len(), 4);
        assert_eq!(markers(buffer.frames()), vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_enqueue_rejects_when_full() {
        let mut buffer = PlaybackBuffer::new(2);
        buffer.enqueue(frame("A", NOW + 1, 1)).unwrap();
        buffer.enqueue(frame("A", NOW + 2, 2)).unwrap();

        let rejected = buffer.enqueue(frame("A", NOW + 3, 3)).unwrap_err();
        assert_eq!(rejected.timestamp, NOW + 3);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_clear_only_affects_one_output() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW + 100, 1)).unwrap();
        buffer.enqueue(frame("B", NOW + 150, 2)).unwrap();
        buffer.enqueue(frame("A", NOW + 200, 3)).unwrap();

        assert_eq!(buffer.clear("A"), 2);
        assert!(buffer.is_empty_for("A"));
        assert!(!buffer.is_empty_for("B"));
        assert!(!buffer.is_empty());
        assert_eq!(buffer.clear("missing"), 0);
    }

    #[test]
    fn test_frame_at_now_is_selected() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW, 1)).unwrap();

        let drained = buffer.drain_ready(NOW, TOLERANCE, STALE, known);
        assert_eq!(markers(&drained.ready), vec![1]);
        assert!(drained.dropped.is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_tolerance_window_is_inclusive() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW - TOLERANCE, 1)).unwrap();
        buffer.enqueue(frame("B", NOW + TOLERANCE, 2)).unwrap();
        buffer.enqueue(frame("C", NOW + TOLERANCE + 1, 3)).unwrap();

        let drained = buffer.drain_ready(NOW, TOLERANCE, STALE, known);
        assert_eq!(markers(&drained.ready), vec![1, 2]);
        assert_eq!(markers(buffer.frames()), vec![3]);
    }

    #[test]
    fn test_stale_frame_is_dropped() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW - (STALE + 1), 1)).unwrap();

        let drained = buffer.drain_ready(NOW, TOLERANCE, STALE, known);
        assert!(drained.ready.is_empty());
        assert_eq!(
            drained.dropped,
            vec![DroppedFrame {
                output_id: "A".into(),
                timestamp: NOW - (STALE + 1),
                cutoff: NOW - STALE,
            }]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_late_frame_within_grace_stays_buffered() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW - 500, 1)).unwrap();
        buffer.enqueue(frame("A", NOW - STALE, 2)).unwrap();
        buffer.enqueue(frame("A", NOW + 500, 3)).unwrap();

        let drained = buffer.drain_ready(NOW, TOLERANCE, STALE, known);
        assert!(drained.ready.is_empty());
        assert!(drained.dropped.is_empty());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_one_frame_per_output_per_pass() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW - 5, 1)).unwrap();
        buffer.enqueue(frame("A", NOW + 5, 2)).unwrap();
        buffer.enqueue(frame("B", NOW, 3)).unwrap();

        let drained = buffer.drain_ready(NOW, TOLERANCE, STALE, known);
        assert_eq!(markers(&drained.ready), vec![1, 3]);
        assert_eq!(markers(buffer.frames()), vec![2]);

        let drained = buffer.drain_ready(NOW + 10, TOLERANCE, STALE, known);
        assert_eq!(markers(&drained.ready), vec![2]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_unknown_outputs_are_purged() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW, 1)).unwrap();
        buffer.enqueue(frame("gone", NOW, 2)).unwrap();
        buffer.enqueue(frame("gone", NOW + 500, 3)).unwrap();

        let drained = buffer.drain_ready(NOW, TOLERANCE, STALE, |id| id == "A");
        assert_eq!(markers(&drained.ready), vec![1]);
        assert_eq!(drained.purged, 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_retain_outputs() {
        let mut buffer = PlaybackBuffer::new(16);
        buffer.enqueue(frame("A", NOW + 100, 1)).unwrap();
        buffer.enqueue(frame("B", NOW + 100, 2)).unwrap();

        assert_eq!(buffer.retain_outputs(|id| id == "A"), 1);
        assert!(buffer.is_empty_for("B"));
        assert_eq!(markers(buffer.frames()), vec![1]);
    }
}
