//! Shared test markup.

pub(crate) const PLAYER_MARKUP: &str = r#"
    <div class="video-loading">Loading video...</div>
    <div class="video-wrapper">
        <video preload="metadata" playsinline><source src="clip.mp4" type="video/mp4"></video>
        <div class="custom-video-controls">
            <div class="controls-bar">
                <button class="control-btn play-pause-btn"><i class="fas fa-play"></i></button>
                <div class="progress-container">
                    <div class="progress-bar"><div class="progress-filled"></div></div>
                    <div class="time-display">
                        <span class="current-time">0:00</span> / <span class="duration">0:00</span>
                    </div>
                </div>
                <button class="control-btn mute-btn"><i class="fas fa-volume-up"></i></button>
                <div class="volume-container">
                    <input type="range" class="volume-slider" min="0" max="1" step="0.1" value="1">
                </div>
                <button class="control-btn fullscreen-btn"><i class="fas fa-expand"></i></button>
            </div>
        </div>
    </div>"#;
