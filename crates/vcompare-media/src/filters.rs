//! FFmpeg filter-graph plan and filter templates.
//!
//! A plan is an ordered list of stages. Each stage reads one or two stream
//! tags and produces exactly one new tag; the last produced tag is the
//! stream that gets mapped to the output file.

use std::collections::HashSet;

/// Video stream of the first input file.
pub const INPUT_A: &str = "0:v";
/// Video stream of the second input file.
pub const INPUT_B: &str = "1:v";

/// Role of a stage within a comparison plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Resize to the target height
    Scale,
    /// Per-stream colour balance shift
    Tint,
    /// Pixel format conversion
    Format,
    /// The comparison operation itself
    Compare,
    /// Luma multiplication after a blend
    Boost,
    /// Presentation timestamp rescaling
    Retime,
}

/// One `[in]...filter[out]` element of a filter graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    pub kind: StageKind,
    pub inputs: Vec<String>,
    pub filter: String,
    pub output: String,
}

impl FilterStage {
    pub fn new<I, S>(kind: StageKind, inputs: I, filter: impl Into<String>, output: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            inputs: inputs.into_iter().map(Into::into).collect(),
            filter: filter.into(),
            output: output.into(),
        }
    }

    /// Render in FFmpeg filtergraph syntax.
    pub fn render(&self) -> String {
        let inputs: String = self.inputs.iter().map(|tag| format!("[{}]", tag)).collect();
        format!("{}{}[{}]", inputs, self.filter, self.output)
    }
}

/// Ordered filter stages plus any non-fatal warnings raised while planning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraphPlan {
    stages: Vec<FilterStage>,
    warnings: Vec<String>,
}

impl FilterGraphPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Tag of the stream mapped to the output.
    pub fn output_tag(&self) -> Option<&str> {
        self.stages.last().map(|s| s.output.as_str())
    }

    /// Number of stages of the given kind.
    pub fn count(&self, kind: StageKind) -> usize {
        self.stages.iter().filter(|s| s.kind == kind).count()
    }

    /// Index of the first stage of the given kind.
    pub fn position(&self, kind: StageKind) -> Option<usize> {
        self.stages.iter().position(|s| s.kind == kind)
    }

    /// Check that every consumed tag is a raw input or was produced earlier,
    /// and that no tag is produced twice.
    pub fn validate_order(&self) -> Result<(), String> {
        let mut produced: HashSet<&str> = HashSet::from([INPUT_A, INPUT_B]);
        for (idx, stage) in self.stages.iter().enumerate() {
            for input in &stage.inputs {
                if !produced.contains(input.as_str()) {
                    return Err(format!("stage {} consumes unknown stream [{}]", idx, input));
                }
            }
            if !produced.insert(stage.output.as_str()) {
                return Err(format!("stage {} redefines stream [{}]", idx, stage.output));
            }
        }
        Ok(())
    }

    /// Serialize as a `-filter_complex` argument.
    pub fn to_filter_complex(&self) -> String {
        self.stages
            .iter()
            .map(FilterStage::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Scale to `height`, keeping the aspect ratio with an even width.
pub fn filter_scale(height: u32) -> String {
    format!("scale=-2:{}", height)
}

/// Width FFmpeg picks for `scale=-2:<height>` on a `src_w`x`src_h` input.
///
/// The aspect-preserving width is rounded to the nearest multiple of two,
/// never below two.
pub fn even_scaled_width(src_w: u32, src_h: u32, height: u32) -> u32 {
    if src_w == 0 || src_h == 0 {
        return 2;
    }
    let exact = f64::from(height) * f64::from(src_w) / f64::from(src_h);
    // Capped so doubling stays even and in range.
    let halves = ((exact / 2.0).round() as u32).min(u32::MAX / 2);
    (halves * 2).max(2)
}

/// Blue midtone shift for stream A.
pub fn filter_tint_blue(shift: f64) -> String {
    format!("colorbalance=bm={}", format_number(shift))
}

/// Green midtone shift for stream B.
pub fn filter_tint_green(shift: f64) -> String {
    format!("colorbalance=gm={}", format_number(shift))
}

// Two-input filters end with the shorter input; `-shortest` alone does not
// cut a single filter_complex output.
pub const FILTER_HSTACK: &str = "hstack=inputs=2:shortest=1";
pub const FILTER_VSTACK: &str = "vstack=inputs=2:shortest=1";
pub const FILTER_DIFFERENCE: &str = "blend=all_mode=difference:shortest=1";
pub const FILTER_SUBTRACT: &str = "blend=all_mode=subtract:shortest=1";
pub const FILTER_OPACITY: &str = "blend=all_mode=normal:all_opacity=0.5:shortest=1";
/// Frame N from A when N is even, from B otherwise.
pub const FILTER_INTERLEAVE: &str = "blend=all_expr=if(eq(mod(N\\,2)\\,0)\\,A\\,B):shortest=1";
/// Planar RGB conversion ahead of the channel mix.
pub const FILTER_PLANAR_RGB: &str = "format=gbrp";
/// gbrp plane order is G, B, R: green averaged, blue from B, red from A.
pub const FILTER_CHANNEL_MIX: &str = "blend=c0_expr=(A+B)/2:c1_expr=B:c2_expr=A:shortest=1";

/// Multiply luma by `factor`, clipped to the valid range.
pub fn filter_brightness_boost(factor: f64) -> String {
    format!("lutyuv=y=clip(val*{}\\,minval\\,maxval)", format_number(factor))
}

/// Rescale timestamps so the stream plays `speed` times as fast.
pub fn filter_retime(speed: f64) -> String {
    format!("setpts={}*PTS", format_number(1.0 / speed))
}

/// Render a float with at most six decimals and no trailing zeros.
fn format_number(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_render() {
        let stage = FilterStage::new(StageKind::Compare, ["a", "b"], FILTER_HSTACK, "out");
        assert_eq!(stage.render(), "[a][b]hstack=inputs=2:shortest=1[out]");
    }

    #[test]
    fn test_two_input_filters_stop_at_shorter_input() {
        for filter in [
            FILTER_HSTACK,
            FILTER_VSTACK,
            FILTER_DIFFERENCE,
            FILTER_SUBTRACT,
            FILTER_OPACITY,
            FILTER_INTERLEAVE,
            FILTER_CHANNEL_MIX,
        ] {
            assert!(filter.ends_with(":shortest=1"), "{}", filter);
        }
    }

    #[test]
    fn test_even_scaled_width_extreme_ratio_does_not_overflow() {
        let w = even_scaled_width(u32::MAX, 1, u32::MAX);
        assert_eq!(w % 2, 0);
        assert!(w >= 2);
    }

    #[test]
    fn test_even_scaled_width_for_common_ratios() {
        assert_eq!(even_scaled_width(1920, 1080, 480), 854);
        assert_eq!(even_scaled_width(1280, 720, 480), 854);
        assert_eq!(even_scaled_width(640, 480, 480), 640);
        assert_eq!(even_scaled_width(1080, 1920, 480), 270);
    }

    #[test]
    fn test_even_scaled_width_is_always_even() {
        for src_w in (1..4000).step_by(7) {
            for src_h in (1..3000).step_by(13) {
                let w = even_scaled_width(src_w, src_h, 480);
                assert_eq!(w % 2, 0, "{}x{} scaled to odd width {}", src_w, src_h, w);
                assert!(w >= 2);
            }
        }
    }

    #[test]
    fn test_even_scaled_width_rounds_to_nearest() {
        // 480 * 701 / 480 = 701 -> 702 (701 / 2 = 350.5 rounds up)
        assert_eq!(even_scaled_width(701, 480, 480), 702);
        // 480 * 699 / 480 = 699 -> 700
        assert_eq!(even_scaled_width(699, 480, 480), 700);
        // 480 * 698.9 / 480 stays at 698
        assert_eq!(even_scaled_width(6989, 4800, 480), 698);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn test_retime_filter() {
        assert_eq!(filter_retime(2.0), "setpts=0.5*PTS");
        assert_eq!(filter_retime(0.5), "setpts=2*PTS");
    }

    #[test]
    fn test_validate_order_rejects_forward_reference() {
        let mut plan = FilterGraphPlan::new();
        plan.push(FilterStage::new(StageKind::Compare, ["0:v", "later"], FILTER_HSTACK, "cmp"));
        plan.push(FilterStage::new(StageKind::Scale, ["1:v"], filter_scale(480), "later"));
        assert!(plan.validate_order().is_err());
    }

    #[test]
    fn test_validate_order_rejects_redefined_tag() {
        let mut plan = FilterGraphPlan::new();
        plan.push(FilterStage::new(StageKind::Scale, ["0:v"], filter_scale(480), "s"));
        plan.push(FilterStage::new(StageKind::Scale, ["1:v"], filter_scale(480), "s"));
        assert!(plan.validate_order().is_err());
    }
}
