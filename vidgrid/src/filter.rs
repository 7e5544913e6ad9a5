// Typed ffmpeg filter graph.
// Filters are plain values; `Display` renders them to the textual syntax ffmpeg
// accepts for `-vf`, `-lavfi` and `-filter_complex`.

use std::fmt;

use crate::opts::LabelStyle;

// Escape text for use inside a single-quoted filter argument
pub fn escape_text(text: &str) -> String {
    text.replace('\'', r"'\''")
}

// One side of a scale / pad size or offset
#[derive(Debug, Clone, PartialEq)]
pub enum Extent {
    Px(u32),
    // keep aspect ratio (-1)
    Auto,
    // raw ffmpeg expression, emitted as-is
    Expr(String),
}

impl Extent {
    pub fn expr(e: impl Into<String>) -> Self {
        Extent::Expr(e.into())
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Px(v) => write!(f, "{v}"),
            Extent::Auto => f.write_str("-1"),
            Extent::Expr(e) => f.write_str(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawText {
    pub text: String,
    pub x: String,
    pub y: String,
    pub font: Option<String>,
    pub color: String,
    pub size: u32,
    // `boxcolor` when a background box is drawn
    pub box_color: Option<String>,
}

impl DrawText {
    // Horizontally centered text
    pub fn centered(text: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            x: String::from("(w-tw)/2"),
            y: y.into(),
            font: None,
            color: String::from("white"),
            size: 24,
            box_color: None,
        }
    }
}

impl fmt::Display for DrawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drawtext=text='{}':x={}:y={}",
            escape_text(&self.text),
            self.x,
            self.y
        )?;
        if let Some(ref font) = self.font {
            write!(f, ":font={font}")?;
        }
        write!(f, ":fontcolor={}:fontsize={}", self.color, self.size)?;
        if let Some(ref box_color) = self.box_color {
            write!(f, ":box=1:boxcolor={box_color}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Fps(f64),
    Scale {
        width: Extent,
        height: Extent,
    },
    Pad {
        width: Extent,
        height: Extent,
        x: Extent,
        y: Extent,
        color: String,
    },
    Trim {
        start: f64,
        end: f64,
    },
    ResetPts,
    // hold the last frame for `duration` seconds
    CloneTail {
        duration: f64,
    },
    DrawText(DrawText),
    SelectFrame(u32),
    XStack {
        layout: Vec<(u32, u32)>,
    },
    PaletteGen {
        stats_mode: String,
    },
    PaletteUse {
        bayer_scale: u8,
    },
    Null,
}

impl Filter {
    pub fn scale_width(width: u32) -> Self {
        Filter::Scale {
            width: Extent::Px(width),
            height: Extent::Auto,
        }
    }

    // Round both sides down to even numbers; yuv420p encoders insist on it
    pub fn scale_even() -> Self {
        Filter::Scale {
            width: Extent::expr("'2*trunc(iw/2)'"),
            height: Extent::expr("'2*trunc(ih/2)'"),
        }
    }

    pub fn pad_black(width: Extent, height: Extent, x: Extent, y: Extent) -> Self {
        Filter::Pad {
            width,
            height,
            x,
            y,
            color: String::from("black"),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Filter::*;
        match self {
            Fps(fps) => write!(f, "fps={fps}"),
            Scale { width, height } => write!(f, "scale={width}:{height}"),
            Pad {
                width,
                height,
                x,
                y,
                color,
            } => write!(f, "pad={width}:{height}:{x}:{y}:{color}"),
            Trim { start, end } => write!(f, "trim={start}:{end:.6}"),
            ResetPts => f.write_str("setpts=PTS-STARTPTS"),
            CloneTail { duration } => {
                write!(f, "tpad=stop_mode=clone:stop_duration={duration:.6}")
            }
            DrawText(dt) => write!(f, "{dt}"),
            SelectFrame(n) => write!(f, r"select=eq(n\,{n})"),
            XStack { layout } => {
                f.write_str("xstack=layout=")?;
                for (idx, (x, y)) in layout.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{x}_{y}")?;
                }
                write!(f, ":inputs={}", layout.len())
            }
            PaletteGen { stats_mode } => write!(f, "palettegen=stats_mode={stats_mode}"),
            PaletteUse { bayer_scale } => {
                write!(f, "paletteuse=dither=bayer:bayer_scale={bayer_scale}")
            }
            Null => f.write_str("null"),
        }
    }
}

// Filters applied in order, optionally between labelled pads
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub output: Option<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, pad: impl Into<String>) -> Self {
        self.inputs.push(pad.into());
        self
    }

    pub fn then(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn then_opt(self, filter: Option<Filter>) -> Self {
        match filter {
            Some(filter) => self.then(filter),
            None => self,
        }
    }

    pub fn output(mut self, pad: impl Into<String>) -> Self {
        self.output = Some(pad.into());
        self
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in self.inputs.iter() {
            write!(f, "[{pad}]")?;
        }
        for (idx, filter) in self.filters.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        if let Some(ref pad) = self.output {
            write!(f, "[{pad}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    pub chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, chain) in self.chains.iter().enumerate() {
            if idx > 0 {
                f.write_str(";")?;
            }
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}

const TITLE_FONT_SIZE: u32 = 36;
const TITLE_BOX_COLOR: &str = "black@0.7";

// drawtext for a cell / frame label, or None when labels are off
pub fn label_filter(style: &LabelStyle, text: &str) -> Option<Filter> {
    if !style.show {
        return None;
    }
    Some(Filter::DrawText(DrawText {
        color: style.color.clone(),
        size: style.size,
        box_color: style.boxed.then(|| style.box_color.clone()),
        ..DrawText::centered(text, style.position.y_expr())
    }))
}

// drawtext centered inside a title band of height `padding`
pub fn title_text(text: &str, padding: u32, font: Option<&str>) -> Filter {
    Filter::DrawText(DrawText {
        font: font.map(String::from),
        size: TITLE_FONT_SIZE,
        box_color: Some(String::from(TITLE_BOX_COLOR)),
        ..DrawText::centered(text, format!("({padding}-th)/2"))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_basic_filters() {
        assert_eq!(Filter::Fps(30.0).to_string(), "fps=30");
        assert_eq!(Filter::Fps(29.97).to_string(), "fps=29.97");
        assert_eq!(Filter::scale_width(640).to_string(), "scale=640:-1");
        assert_eq!(
            Filter::scale_even().to_string(),
            "scale='2*trunc(iw/2)':'2*trunc(ih/2)'"
        );
        assert_eq!(
            Filter::pad_black(Extent::Px(640), Extent::Px(376), Extent::Px(0), Extent::Px(8))
                .to_string(),
            "pad=640:376:0:8:black"
        );
        assert_eq!(
            Filter::Trim {
                start: 0.0,
                end: 4.933333333
            }
            .to_string(),
            "trim=0:4.933333"
        );
        assert_eq!(
            Filter::CloneTail { duration: 0.1 }.to_string(),
            "tpad=stop_mode=clone:stop_duration=0.100000"
        );
        assert_eq!(Filter::SelectFrame(30).to_string(), r"select=eq(n\,30)");
        assert_eq!(
            Filter::PaletteUse { bayer_scale: 5 }.to_string(),
            "paletteuse=dither=bayer:bayer_scale=5"
        );
    }

    #[test]
    fn drawtext_escapes_and_boxes() {
        let mut dt = DrawText::centered("it's 3", "h-40");
        assert_eq!(
            Filter::DrawText(dt.clone()).to_string(),
            r"drawtext=text='it'\''s 3':x=(w-tw)/2:y=h-40:fontcolor=white:fontsize=24"
        );
        dt.font = Some(String::from("Arial"));
        dt.box_color = Some(String::from("black@0.7"));
        dt.size = 36;
        assert_eq!(
            dt.to_string(),
            r"drawtext=text='it'\''s 3':x=(w-tw)/2:y=h-40:font=Arial:fontcolor=white:fontsize=36:box=1:boxcolor=black@0.7"
        );
    }

    #[test]
    fn label_and_title_helpers() {
        let mut style = LabelStyle::default();
        assert_eq!(
            label_filter(&style, "3").unwrap().to_string(),
            "drawtext=text='3':x=(w-tw)/2:y=h-40:fontcolor=white:fontsize=24:box=1:boxcolor=black@0.5"
        );
        style.show = false;
        assert_eq!(label_filter(&style, "3"), None);

        assert_eq!(
            title_text("run", 80, None).to_string(),
            "drawtext=text='run':x=(w-tw)/2:y=(80-th)/2:fontcolor=white:fontsize=36:box=1:boxcolor=black@0.7"
        );
    }

    #[test]
    fn xstack_layout() {
        let f = Filter::XStack {
            layout: vec![(0, 0), (640, 0), (0, 376)],
        };
        assert_eq!(f.to_string(), "xstack=layout=0_0|640_0|0_376:inputs=3");
    }

    #[test]
    fn graph_joins_chains() {
        let mut graph = FilterGraph::default();
        graph.push(
            FilterChain::new()
                .input("0:v")
                .then(Filter::scale_width(320))
                .then(Filter::ResetPts)
                .output("v0"),
        );
        graph.push(
            FilterChain::new()
                .input("v0")
                .then(Filter::Null)
                .then_opt(None)
                .output("final"),
        );
        assert_eq!(
            graph.to_string(),
            "[0:v]scale=320:-1,setpts=PTS-STARTPTS[v0];[v0]null[final]"
        );
    }

    #[test]
    fn bare_chain_for_simple_filters() {
        let chain = FilterChain::new()
            .then(Filter::SelectFrame(0))
            .then(Filter::scale_width(100));
        assert_eq!(chain.to_string(), r"select=eq(n\,0),scale=100:-1");
    }
}
