#[cfg(feature = "integration-tests")]
mod common;

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn point_cloud_uploads_and_builds_its_pipeline() {
    use model_ngin::{
        PointCloud, SceneNode,
        data_structures::{
            instance::Instance,
            scene_graph::Renderable,
            material::{ColorMap, ImageTexture, PointsMaterial},
            texture::soft_circle_sprite,
        },
        pipelines::points::mk_points_pipeline,
        render::{PointCloudBuffers, camera_layout},
    };
    use std::sync::Arc;

    use crate::common::test_utils::unit_cube;

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..wgpu::InstanceDescriptor::new_without_display_handle()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .expect("no adapter available");
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default())
        .await
        .expect("no device available");

    let sprite = ColorMap::Texture(ImageTexture {
        name: "soft circle".to_string(),
        image: Arc::new(soft_circle_sprite(16)),
    });
    let material = PointsMaterial::default().with_alpha_map(sprite);
    let cloud = PointCloud::sample(&unit_cube(), 100).unwrap();
    let cloud = PointCloud {
        material: material.clone(),
        ..cloud
    };

    let mut node = SceneNode::new("points");
    node.local = Instance::from(cgmath::Vector3::new(0.0, 1.0, 0.0));
    node.renderables.push(Renderable::Points(cloud));
    let root = SceneNode::group("root", vec![node]);

    let buffers = PointCloudBuffers::from_scene(&device, &queue, &root).unwrap();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].len(), 100);

    let _pipeline = mk_points_pipeline(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        &camera_layout(&device),
        &material,
    );
}
