//! # Caption 模块
//!
//! 每个宠物共享的字幕区域。
//!
//! 显示新字幕会替换当前字幕；隐藏只作用于调用者持有的那条字幕，
//! 若它已被新字幕替换则什么也不做。

/// 字幕句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptionId(pub u64);

/// 字幕区域
pub trait CaptionSurface {
    /// 显示字幕，替换当前字幕
    fn show(&mut self, text: &str) -> CaptionId;

    /// 淡出并移除指定字幕
    fn hide(&mut self, id: CaptionId);

    /// 移除字幕区域
    fn clear(&mut self);
}

/// 字幕阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionPhase {
    /// 淡入 / 显示中
    Visible,
    /// 淡出中，动画结束后由界面调用 [`CaptionBoard::finish_fade_out`] 移除
    FadingOut,
}

/// 一条字幕
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub id: CaptionId,
    pub text: String,
    pub phase: CaptionPhase,
}

/// 字幕面板
///
/// 界面层读取 [`CaptionBoard::current`] 渲染字幕，
/// 淡入淡出动画时长为 [`CaptionBoard::FADE_SECONDS`]。
#[derive(Debug, Default)]
pub struct CaptionBoard {
    current: Option<Caption>,
    fading: Vec<Caption>,
    next_id: u64,
}

impl CaptionBoard {
    /// 淡入 / 淡出动画时长（秒）
    pub const FADE_SECONDS: f32 = 0.5;

    pub fn new() -> Self {
        Self::default()
    }

    /// 当前显示的字幕
    pub fn current(&self) -> Option<&Caption> {
        self.current.as_ref()
    }

    /// 正在淡出的字幕
    pub fn fading(&self) -> &[Caption] {
        &self.fading
    }

    /// 淡出动画结束，移除字幕
    pub fn finish_fade_out(&mut self, id: CaptionId) {
        self.fading.retain(|caption| caption.id != id);
    }
}

impl CaptionSurface for CaptionBoard {
    fn show(&mut self, text: &str) -> CaptionId {
        let id = CaptionId(self.next_id);
        self.next_id += 1;
        // 替换所有子元素
        self.fading.clear();
        self.current = Some(Caption {
            id,
            text: text.to_string(),
            phase: CaptionPhase::Visible,
        });
        id
    }

    fn hide(&mut self, id: CaptionId) {
        if let Some(caption) = self.current.take_if(|caption| caption.id == id) {
            self.fading.push(Caption {
                phase: CaptionPhase::FadingOut,
                ..caption
            });
        }
    }

    fn clear(&mut self) {
        self.current = None;
        self.fading.clear();
    }
}
