use slotmap::new_key_type;

// 所有的 GPU 资源都通过轻量级的 Handle 访问，真正的资源由 GfxDevice 持有
new_key_type! {
    /// GPU Buffer Handle
    pub struct GfxBufferHandle;
    /// GPU Texture Handle
    pub struct GfxTextureHandle;
    /// Sampler Handle
    pub struct GfxSamplerHandle;
    /// 绑定到 pipeline slot 上的一组资源（descriptor set）
    pub struct GfxResourceSetHandle;
    /// 光追 pipeline 或者光栅 pipeline
    pub struct GfxPipelineHandle;
}
