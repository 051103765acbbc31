use crate::pipeline::Segment;

fn split(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
}

/// `HH:MM:SS,mmm`
pub fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// `HH:MM:SS.mmm`
pub fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

pub fn render_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text.trim()
        ));
    }
    out
}

pub fn render_vtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in segments {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end),
            segment.text.trim()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<Segment> {
        vec![
            Segment {
                start: 0.0,
                end: 2.5,
                text: " Hello ".into(),
            },
            Segment {
                start: 3661.042,
                end: 3662.0,
                text: "World".into(),
            },
        ]
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(3661.042), "01:01:01,042");
        assert_eq!(format_vtt_timestamp(59.9996), "00:01:00.000");
        assert_eq!(format_vtt_timestamp(-1.0), "00:00:00.000");
    }

    #[test]
    fn test_render_srt() {
        assert_eq!(
            render_srt(&segments()),
            "1\n00:00:00,000 --> 00:00:02,500\nHello\n\n\
             2\n01:01:01,042 --> 01:01:02,000\nWorld\n\n"
        );
    }

    #[test]
    fn test_render_vtt() {
        let vtt = render_vtt(&segments());
        assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:02.500\nHello\n\n"));
        assert!(vtt.ends_with("01:01:01.042 --> 01:01:02.000\nWorld\n\n"));
    }
}
