use anyhow::Result;
use ash::vk;

use lantern::{Error, Swapchain};

use framework::{extent, surface_format, MockDevice};

mod framework;

fn make_swapchain(device: &MockDevice, vsync: bool) -> lantern::core::error::Result<Swapchain<MockDevice>> {
    Swapchain::new(device.clone(), &device.surface(), vsync, None, extent(800, 600))
}

#[test]
pub fn one_view_per_image() -> Result<()> {
    let device = MockDevice::new();
    let swapchain = make_swapchain(&device, true)?;
    // minImageCount = 2 without maximum, so one extra image is requested.
    assert_eq!(swapchain.config().image_count, 3);
    assert_eq!(swapchain.image_count(), 3);
    assert_eq!(swapchain.views().len(), swapchain.images().len());
    assert_eq!(device.live_of_kind("image view"), 3);
    assert_eq!(swapchain.extent(), extent(800, 600));
    assert_eq!(swapchain.generation(), 0);
    Ok(())
}

#[test]
pub fn driver_may_create_more_images() -> Result<()> {
    let device = MockDevice::new();
    device.state().extra_images = 2;
    let swapchain = make_swapchain(&device, true)?;
    assert_eq!(swapchain.config().image_count, 3);
    assert_eq!(swapchain.image_count(), 5);
    assert_eq!(swapchain.views().len(), 5);
    Ok(())
}

#[test]
pub fn only_reported_format_is_selected() -> Result<()> {
    let device = MockDevice::new();
    device.state().support.formats = vec![surface_format(vk::Format::R8G8B8A8_UNORM)];
    let swapchain = make_swapchain(&device, true)?;
    assert_eq!(swapchain.format(), surface_format(vk::Format::R8G8B8A8_UNORM));
    assert_eq!(device.state().last_config.map(|config| config.format), Some(swapchain.format()));
    Ok(())
}

#[test]
pub fn preferred_format_is_used_when_supported() -> Result<()> {
    let device = MockDevice::new();
    let hdr = vk::SurfaceFormatKHR {
        format: vk::Format::A2B10G10R10_UNORM_PACK32,
        color_space: vk::ColorSpaceKHR::HDR10_ST2084_EXT,
    };
    device.state().support.formats = vec![surface_format(vk::Format::B8G8R8A8_UNORM), hdr];
    let swapchain = Swapchain::new(device.clone(), &device.surface(), true, Some(hdr), extent(800, 600))?;
    assert_eq!(swapchain.format(), hdr);
    Ok(())
}

#[test]
pub fn vsync_controls_present_mode() -> Result<()> {
    let device = MockDevice::new();
    assert_eq!(make_swapchain(&device, true)?.present_mode(), vk::PresentModeKHR::FIFO);
    assert_eq!(make_swapchain(&device, false)?.present_mode(), vk::PresentModeKHR::IMMEDIATE);
    Ok(())
}

#[test]
pub fn image_count_respects_maximum() -> Result<()> {
    let device = MockDevice::new();
    device.state().support.capabilities.max_image_count = 2;
    let swapchain = make_swapchain(&device, true)?;
    assert_eq!(swapchain.config().image_count, 2);

    device.state().support.capabilities.max_image_count = 3;
    let swapchain = make_swapchain(&device, true)?;
    assert_eq!(swapchain.config().image_count, 3);
    Ok(())
}

#[test]
pub fn unsupported_surface_is_rejected() -> Result<()> {
    let device = MockDevice::new();
    device.state().support.present_modes.clear();
    let result = make_swapchain(&device, true);
    assert!(matches!(result, Err(Error::UnsupportedSurface)));
    assert_eq!(device.count("vkCreateSwapchainKHR"), 0);
    Ok(())
}

#[test]
pub fn views_are_destroyed_before_swapchain() -> Result<()> {
    let device = MockDevice::new();
    let mut swapchain = make_swapchain(&device, true)?;
    let old_views: Vec<_> = swapchain.views().to_vec();
    device.clear_calls();

    assert!(swapchain.rebuild(extent(800, 600))?);

    let ops = device.ops();
    let destroy_swapchain = ops.iter().position(|op| *op == "vkDestroySwapchainKHR").unwrap();
    let create_swapchain = ops.iter().position(|op| *op == "vkCreateSwapchainKHR").unwrap();
    let view_destroys: Vec<_> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| **op == "vkDestroyImageView")
        .map(|(index, _)| index)
        .collect();
    assert_eq!(view_destroys.len(), old_views.len());
    assert!(view_destroys.iter().all(|index| *index < destroy_swapchain));
    assert!(destroy_swapchain < create_swapchain);
    Ok(())
}

#[test]
pub fn rebuild_is_idempotent() -> Result<()> {
    let device = MockDevice::new();
    let mut swapchain = make_swapchain(&device, true)?;
    let live = device.live_count();

    assert!(swapchain.rebuild(extent(800, 600))?);
    let first = (swapchain.image_count(), swapchain.extent(), swapchain.format());
    assert!(swapchain.rebuild(extent(800, 600))?);
    let second = (swapchain.image_count(), swapchain.extent(), swapchain.format());

    assert_eq!(first, second);
    assert_eq!(device.live_count(), live);
    assert_eq!(swapchain.generation(), 2);
    Ok(())
}

#[test]
pub fn rebuild_picks_up_new_extent() -> Result<()> {
    let device = MockDevice::new();
    let mut swapchain = make_swapchain(&device, true)?;
    device.set_surface_extent(1280, 720);
    assert!(swapchain.rebuild(extent(1280, 720))?);
    assert_eq!(swapchain.extent(), extent(1280, 720));
    Ok(())
}

#[test]
pub fn zero_extent_postpones_rebuild() -> Result<()> {
    let device = MockDevice::new();
    let mut swapchain = make_swapchain(&device, true)?;
    device.set_surface_extent(0, 0);
    device.clear_calls();

    assert!(!swapchain.rebuild(extent(0, 0))?);
    assert_eq!(device.count("vkDestroySwapchainKHR"), 0);
    assert_eq!(device.count("vkDestroyImageView"), 0);
    assert!(swapchain.is_valid());
    assert_eq!(swapchain.generation(), 0);
    Ok(())
}

#[test]
pub fn prepare_rebuild_destroys_nothing() -> Result<()> {
    let device = MockDevice::new();
    let mut swapchain = make_swapchain(&device, true)?;
    device.set_surface_extent(1024, 768);
    device.clear_calls();

    let config = swapchain.prepare_rebuild(extent(1024, 768))?.unwrap();
    assert_eq!(config.extent, extent(1024, 768));
    assert_eq!(device.count("vkDestroyImageView"), 0);
    assert_eq!(device.count("vkDestroySwapchainKHR"), 0);
    assert_eq!(swapchain.extent(), extent(800, 600));

    swapchain.replace(config)?;
    assert_eq!(device.count("vkDestroyImageView"), 3);
    assert_eq!(swapchain.extent(), extent(1024, 768));
    assert_eq!(swapchain.generation(), 1);
    Ok(())
}

#[test]
pub fn failed_view_creation_rolls_back() -> Result<()> {
    let device = MockDevice::new();
    device.fail_on("vkCreateImageView", 1, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    let err = make_swapchain(&device, true).unwrap_err();
    assert!(err.to_string().contains("vkCreateImageView"));
    assert!(err.is_device_result(vk::Result::ERROR_OUT_OF_HOST_MEMORY));
    assert_eq!(device.live_count(), 0);
    Ok(())
}

#[test]
pub fn drop_destroys_everything() -> Result<()> {
    let device = MockDevice::new();
    {
        let _swapchain = make_swapchain(&device, true)?;
        assert_eq!(device.live_count(), 4);
    }
    assert_eq!(device.live_count(), 0);
    Ok(())
}
