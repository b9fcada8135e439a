use crate::device::AcquireOutcome;

pub(super) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }

    caps.formats.first().copied()
}

pub(super) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub(super) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        requested
    } else {
        // FIFO is the only mode every surface must support.
        wgpu::PresentMode::Fifo
    }
}

/// Maps a surface acquisition error onto the presenter's acquire outcome.
pub(super) fn map_acquire_error(err: wgpu::SurfaceError) -> AcquireOutcome {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => AcquireOutcome::OutOfDate,
        wgpu::SurfaceError::OutOfMemory => {
            log::error!("surface acquisition ran out of memory");
            AcquireOutcome::Failed
        }
        wgpu::SurfaceError::Timeout => {
            log::warn!("surface acquisition timed out");
            AcquireOutcome::Failed
        }
        wgpu::SurfaceError::Other => {
            log::warn!("surface acquisition failed");
            AcquireOutcome::Failed
        }
    }
}
