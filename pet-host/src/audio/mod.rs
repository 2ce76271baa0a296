//! # Audio 模块
//!
//! 每个宠物共享一个音频播放器。
//!
//! 播放器以轮询事件的方式报告状态：
//!
//! - [`AudioEvent::CanPlay`]：新音源已可播放
//! - [`AudioEvent::Ended`]：播放结束
//!
//! 运行时每帧调用 [`AudioPlayer::poll_event`]，
//! 事件处理与帧循环处于同一线程，不需要回调。

mod rodio_player;

pub use rodio_player::RodioAudioPlayer;

use thiserror::Error;

/// 音频事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    /// 已可播放
    CanPlay,
    /// 播放结束
    Ended,
}

/// 音频错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// 音频输出设备不可用
    #[error("无法初始化音频输出: {0}")]
    Output(String),

    /// 音频数据无法解码
    #[error("无法解码音频: {0}")]
    Decode(String),

    /// 没有可播放的音源
    #[error("没有待播放的音源")]
    NoSource,
}

/// 音频播放器
pub trait AudioPlayer {
    /// 设置新音源（替换当前音源），可播放时产生 [`AudioEvent::CanPlay`]
    fn set_source(&mut self, bytes: Vec<u8>) -> Result<(), AudioError>;

    /// 开始播放当前音源，播放完毕后产生 [`AudioEvent::Ended`]
    ///
    /// 失败时不会产生任何事件。
    fn play(&mut self) -> Result<(), AudioError>;

    /// 停止并丢弃当前音源
    fn stop(&mut self);

    /// 设置音量（0.0 - 1.0）
    fn set_volume(&mut self, volume: f32);

    /// 当前音量
    fn volume(&self) -> f32;

    /// 取出一个待处理事件
    fn poll_event(&mut self) -> Option<AudioEvent>;
}

/// 百分比音量换算为 0.0 - 1.0
pub fn volume_from_percent(percent: f32) -> f32 {
    percent.clamp(0.0, 100.0) / 100.0
}
