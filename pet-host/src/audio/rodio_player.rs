//! 基于 rodio 的音频播放器

use super::{AudioError, AudioEvent, AudioPlayer};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::VecDeque;
use std::io::Cursor;
use tracing::{debug, warn};

type MemoryDecoder = Decoder<Cursor<Vec<u8>>>;

/// rodio 音频播放器
pub struct RodioAudioPlayer {
    /// 音频输出流（必须保持存活）
    _stream: OutputStream,
    /// 音频输出句柄
    stream_handle: OutputStreamHandle,
    /// 当前播放器
    sink: Option<Sink>,
    /// 已解码、尚未开始播放的音源
    pending: Option<MemoryDecoder>,
    /// 是否处于播放中（用于检测结束）
    playing: bool,
    volume: f32,
    events: VecDeque<AudioEvent>,
}

impl RodioAudioPlayer {
    /// 打开默认输出设备
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::Output(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            pending: None,
            playing: false,
            volume: 1.0,
            events: VecDeque::new(),
        })
    }
}

impl AudioPlayer for RodioAudioPlayer {
    fn set_source(&mut self, bytes: Vec<u8>) -> Result<(), AudioError> {
        self.stop();

        let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| {
            warn!(error = %e, "音频解码失败");
            AudioError::Decode(e.to_string())
        })?;

        self.pending = Some(decoder);
        self.events.push_back(AudioEvent::CanPlay);
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let Some(source) = self.pending.take() else {
            debug!("没有待播放的音源");
            return Err(AudioError::NoSource);
        };

        let sink = Sink::try_new(&self.stream_handle).map_err(|e| {
            warn!(error = %e, "无法创建音频播放器");
            AudioError::Output(e.to_string())
        })?;
        sink.set_volume(self.volume);
        sink.append(source);
        self.sink = Some(sink);
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.pending = None;
        self.playing = false;
        self.events.clear();
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }

        if self.playing && self.sink.as_ref().is_none_or(Sink::empty) {
            self.playing = false;
            self.sink = None;
            return Some(AudioEvent::Ended);
        }

        None
    }
}
