//! 粒子批量渲染器
//!
//! prepare/draw 两段式：`begin_frame` + `queue_pool` 在渲染通道外
//! 完成实例打包与上传，`draw` 在渲染通道内按混合模式分组提交。
//! 提交必须严格发生在当帧模拟完成之后（池状态此时只读）。

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::pool::ParticlePool;
use crate::profile::BlendMode;

/// 逐实例属性（对应 WGSL 的 instance 输入）
///
/// 紧凑 32 字节：渲染只需要这四个字段，其余模拟状态不上传。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    /// 世界坐标位置
    pub position: [f32; 2],
    /// 大小
    pub size: f32,
    /// 旋转（弧度）
    pub rotation: f32,
    /// 颜色 (RGBA)
    pub color: [f32; 4],
}

/// 共享四边形顶点（角偏移 + 纹理坐标）
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    corner: [f32; 2],
    uv: [f32; 2],
}

/// 单位四边形：以原点为中心的两个三角形
const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { corner: [-0.5, -0.5], uv: [0.0, 1.0] },
    QuadVertex { corner: [0.5, -0.5], uv: [1.0, 1.0] },
    QuadVertex { corner: [0.5, 0.5], uv: [1.0, 0.0] },
    QuadVertex { corner: [-0.5, -0.5], uv: [0.0, 1.0] },
    QuadVertex { corner: [0.5, 0.5], uv: [1.0, 0.0] },
    QuadVertex { corner: [-0.5, 0.5], uv: [0.0, 0.0] },
];

/// 视图投影 Uniform
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleUniforms {
    view_proj: [[f32; 4]; 4],
}

/// 按池遍历顺序打包存活粒子的渲染字段
///
/// 纯 CPU 路径，独立出来便于无 GPU 设备的单元测试。
pub fn gather_instances(pool: &ParticlePool) -> Vec<ParticleInstance> {
    let mut instances = Vec::with_capacity(pool.live_count());
    fill_instances(pool, &mut instances);
    instances
}

fn fill_instances(pool: &ParticlePool, out: &mut Vec<ParticleInstance>) {
    out.clear();
    pool.for_each_live(|_, p| {
        out.push(ParticleInstance {
            position: p.position.to_array(),
            size: p.size,
            rotation: p.rotation,
            color: p.color.to_array(),
        });
    });
}

/// 单个池对应的一批实例数据
struct PoolBatch {
    /// CPU 侧暂存（跨帧复用，避免每帧分配）
    instances: Vec<ParticleInstance>,
    /// GPU 实例缓冲区
    buffer: wgpu::Buffer,
    /// 缓冲区可容纳的实例数
    buffer_capacity: usize,
    /// 混合模式
    blend_mode: BlendMode,
    /// 本帧实例数
    count: u32,
}

/// 粒子批量渲染器
///
/// 两条渲染管线仅混合状态不同（Alpha / Additive），均禁用深度写入。
/// `draw` 先提交所有 Alpha 批次、再提交所有 Additive 批次，
/// 让发光效果叠加在基础合成之上。
pub struct ParticleBatchRenderer {
    pipeline_alpha: wgpu::RenderPipeline,
    pipeline_additive: wgpu::RenderPipeline,
    quad_vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// 批次槽位（跨帧复用）
    batches: Vec<PoolBatch>,
    /// 本帧已排队的批次数
    queued: usize,
}

impl ParticleBatchRenderer {
    /// 创建渲染器
    ///
    /// `texture_view`/`sampler` 是所有粒子共享的纹理绑定（外部提供）。
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_particles.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Uniforms"),
            size: std::mem::size_of::<ParticleUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Additive: 颜色累加（SrcAlpha/One），重叠处与提交顺序无关
        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let pipeline_alpha = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            wgpu::BlendState::ALPHA_BLENDING,
            "Particle Pipeline (Alpha)",
        );
        let pipeline_additive = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            additive_blend,
            "Particle Pipeline (Additive)",
        );

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            pipeline_alpha,
            pipeline_additive,
            quad_vertex_buffer,
            uniform_buffer,
            bind_group,
            batches: Vec::new(),
            queued: 0,
        }
    }

    /// 开始新的一帧：清空批次队列并上传视图投影矩阵
    pub fn begin_frame(&mut self, queue: &wgpu::Queue, view_projection: Mat4) {
        self.queued = 0;
        let uniforms = ParticleUniforms {
            view_proj: view_projection.to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// 把一个池排入本帧的提交队列
    ///
    /// 空池不产生任何 GPU 工作。实例缓冲区按池容量创建并跨帧复用，
    /// 每池恰好一次 `write_buffer` 上传。
    pub fn queue_pool(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pool: &ParticlePool,
        blend_mode: BlendMode,
    ) {
        if pool.live_count() == 0 {
            return;
        }

        // 取出或新建批次槽位
        if self.queued == self.batches.len() {
            self.batches.push(PoolBatch {
                instances: Vec::with_capacity(pool.capacity()),
                buffer: create_instance_buffer(device, pool.capacity()),
                buffer_capacity: pool.capacity(),
                blend_mode,
                count: 0,
            });
        }
        let batch = &mut self.batches[self.queued];

        // 池容量可能比槽位上次服务的池更大
        if batch.buffer_capacity < pool.capacity() {
            batch.buffer = create_instance_buffer(device, pool.capacity());
            batch.buffer_capacity = pool.capacity();
        }

        fill_instances(pool, &mut batch.instances);
        batch.blend_mode = blend_mode;
        batch.count = batch.instances.len() as u32;
        queue.write_buffer(&batch.buffer, 0, bytemuck::cast_slice(&batch.instances));

        self.queued += 1;
    }

    /// 提交本帧全部批次
    ///
    /// 每批次一次实例化绘制；Alpha 组全部先于 Additive 组。
    pub fn draw<'pass>(&'pass self, pass: &mut wgpu::RenderPass<'pass>) {
        if self.queued == 0 {
            return;
        }

        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));

        let modes: Vec<BlendMode> = self.batches[..self.queued]
            .iter()
            .map(|b| b.blend_mode)
            .collect();

        let mut current_mode = None;
        for index in submission_order(&modes) {
            let batch = &self.batches[index];
            if current_mode != Some(batch.blend_mode) {
                pass.set_pipeline(match batch.blend_mode {
                    BlendMode::Alpha => &self.pipeline_alpha,
                    BlendMode::Additive => &self.pipeline_additive,
                });
                current_mode = Some(batch.blend_mode);
            }
            pass.set_vertex_buffer(1, batch.buffer.slice(..));
            pass.draw(0..QUAD_VERTICES.len() as u32, 0..batch.count);
        }
    }

    /// 本帧已排队的批次数（每批次一次 draw）
    pub fn queued_batches(&self) -> usize {
        self.queued
    }
}

/// 混合模式的提交顺序：Alpha 组在前，Additive 组在后，组内保持排队顺序
///
/// `draw` 遵循同一顺序；独立成函数便于无 GPU 设备验证提交顺序。
pub(crate) fn submission_order(modes: &[BlendMode]) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(modes.len());
    for wanted in [BlendMode::Alpha, BlendMode::Additive] {
        order.extend(
            modes
                .iter()
                .enumerate()
                .filter(|(_, m)| **m == wanted)
                .map(|(i, _)| i),
        );
    }
    order
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Instance Buffer"),
        size: (capacity * std::mem::size_of::<ParticleInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<ParticleInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![2 => Float32x2, 3 => Float32, 4 => Float32, 5 => Float32x4],
                },
            ],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        // 粒子不写深度：半透明排序交给混合模式分组处理
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
