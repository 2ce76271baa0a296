//! 资源加载编排
//!
//! 解析模型设定后，按阶段拉取并登记模型的全部资源：
//!
//! 1. 模型设定（模型文件名为空即失败）
//! 2. 模型二进制
//! 3. 表情（并发拉取，同名替换并释放旧句柄）
//! 4. 物理、姿势（声明了才加载）
//! 5. 眨眼（至少一个眨眼参数时）与呼吸
//! 6. 用户数据
//! 7. 眨眼 / 口型参数 ID
//! 8. 布局与参数快照
//! 9. 动作（分组并发，组内顺序拉取）
//! 10. 渲染器与纹理（并发拉取解码，空文件名跳过）
//!
//! 同一阶段的并发拉取全部成功才继续，任何一个失败都会中止其余拉取，
//! 整次加载失败，已登记的句柄全部释放。

use super::AnimationModel;
use crate::engine::{MotionConfig, TextureImage, decode_texture, default_breath_parameters};
use crate::error::{LoadFailure, LoadStage, PetError, PetResult};
use crate::resources::{AssetProvider, ResourceError, path::join_logical};
use pet_runtime::{ModelMatrix, ModelSettings, motion_key};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// 资源加载器
pub struct AssetLoader<P> {
    provider: Arc<P>,
}

impl<P> Clone for AssetLoader<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: AssetProvider> AssetLoader<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// 加载模型目录下 `settings_file` 描述的全部资源
    ///
    /// 失败时模型不可用，已登记的动作与表情会被释放。
    pub async fn load(&self, model: &mut AnimationModel, settings_file: &str) -> PetResult<()> {
        match self.load_stages(model, settings_file).await {
            Ok(()) => {
                model.set_loaded(true);
                info!(
                    home = %model.home_dir(),
                    expressions = model.expression_count(),
                    motions = model.motion_count(),
                    "模型加载完成"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, home = %model.home_dir(), "模型加载失败");
                model.release_resources();
                Err(e)
            }
        }
    }

    /// 重建渲染器并重新上传纹理（不重新拉取动作与表情）
    pub async fn reload_renderer(&self, model: &mut AnimationModel) -> PetResult<()> {
        let Some(settings) = model.settings().cloned() else {
            return Err(PetError::load(
                LoadStage::Renderer,
                crate::engine::EngineError::ModelNotLoaded,
            ));
        };
        model.engine_mut().delete_renderer();
        self.setup_textures(model, &settings).await
    }

    async fn load_stages(&self, model: &mut AnimationModel, settings_file: &str) -> PetResult<()> {
        let home = model.home_dir().to_string();

        // 1. 模型设定
        let settings_path = join_logical(&home, settings_file);
        let bytes = self
            .provider
            .read_bytes(&settings_path)
            .await
            .map_err(|e| PetError::load(LoadStage::Settings, e))?;
        let settings =
            ModelSettings::from_bytes(&bytes).map_err(|e| PetError::load(LoadStage::Settings, e))?;
        for warning in settings.validate() {
            warn!(warning = %warning, "模型设定警告");
        }
        model.set_settings(settings.clone());

        // 2. 模型二进制
        let bytes = self
            .read(&home, settings.model_file_name())
            .await
            .map_err(|e| PetError::load(LoadStage::Model, e))?;
        model
            .engine_mut()
            .load_model(&bytes)
            .map_err(|e| PetError::load(LoadStage::Model, e))?;

        // 3. 表情
        self.load_expressions(model, &settings).await?;

        // 4. 物理、姿势
        let has_physics = match settings.physics_file_name() {
            Some(file) => {
                let bytes = self
                    .read(&home, file)
                    .await
                    .map_err(|e| PetError::load(LoadStage::Physics, e))?;
                model
                    .engine_mut()
                    .load_physics(&bytes)
                    .map_err(|e| PetError::load(LoadStage::Physics, e))?;
                true
            }
            None => false,
        };

        let has_pose = match settings.pose_file_name() {
            Some(file) => {
                let bytes = self
                    .read(&home, file)
                    .await
                    .map_err(|e| PetError::load(LoadStage::Pose, e))?;
                model
                    .engine_mut()
                    .load_pose(&bytes)
                    .map_err(|e| PetError::load(LoadStage::Pose, e))?;
                true
            }
            None => false,
        };

        // 5. 眨眼与呼吸
        let eye_blink_ids = settings.eye_blink_ids();
        let has_eye_blink = !eye_blink_ids.is_empty();
        if has_eye_blink {
            model.engine_mut().create_eye_blink(&eye_blink_ids);
        }
        model.engine_mut().create_breath(&default_breath_parameters());
        model.set_controllers(has_eye_blink, true, has_physics, has_pose);

        // 6. 用户数据
        if let Some(file) = settings.user_data_file_name() {
            let bytes = self
                .read(&home, file)
                .await
                .map_err(|e| PetError::load(LoadStage::UserData, e))?;
            model
                .engine_mut()
                .load_user_data(&bytes)
                .map_err(|e| PetError::load(LoadStage::UserData, e))?;
        }

        // 7. 效果参数
        model.set_effect_ids(eye_blink_ids, settings.lip_sync_ids());

        // 8. 布局
        let (canvas_w, canvas_h) = model.engine().canvas_size();
        let mut model_matrix = ModelMatrix::new(canvas_w, canvas_h);
        model_matrix.setup_from_layout(&settings.layout);
        model.set_model_matrix(model_matrix);
        model.engine_mut().save_parameters();

        // 9. 动作
        self.load_motions(model, &settings).await?;
        model.engine_mut().stop_all_motions();

        // 10. 渲染器与纹理
        self.setup_textures(model, &settings).await
    }

    async fn read(&self, home: &str, file: &str) -> Result<Vec<u8>, ResourceError> {
        self.provider.read_bytes(&join_logical(home, file)).await
    }

    async fn load_expressions(
        &self,
        model: &mut AnimationModel,
        settings: &ModelSettings,
    ) -> PetResult<()> {
        let home = model.home_dir().to_string();
        let paths = settings
            .expressions()
            .iter()
            .map(|expression| join_logical(&home, &expression.file))
            .collect();
        let fetched = fetch_all(&self.provider, paths)
            .await
            .map_err(|e| PetError::load(LoadStage::Expressions, e))?;

        for (expression, bytes) in settings.expressions().iter().zip(fetched) {
            let engine = model.engine_mut();
            let handle = engine
                .load_expression(&expression.name, &bytes)
                .map_err(|e| PetError::load(LoadStage::Expressions, e))?;
            if expression.fade_in_time.is_some() || expression.fade_out_time.is_some() {
                engine.configure_expression(
                    handle,
                    expression.fade_in_time.filter(|t| *t >= 0.0),
                    expression.fade_out_time.filter(|t| *t >= 0.0),
                );
            }
            model.register_expression(&expression.name, handle);
        }

        debug!(count = model.expression_count(), "表情加载完成");
        Ok(())
    }

    async fn load_motions(
        &self,
        model: &mut AnimationModel,
        settings: &ModelSettings,
    ) -> PetResult<()> {
        let home = model.home_dir().to_string();
        let mut set = JoinSet::new();

        for (group, motions) in settings.motion_groups() {
            let provider = Arc::clone(&self.provider);
            let group = group.to_string();
            let paths: Vec<String> = motions
                .iter()
                .map(|motion| join_logical(&home, &motion.file))
                .collect();

            // 组内顺序拉取
            set.spawn(async move {
                let mut fetched = Vec::with_capacity(paths.len());
                for path in paths {
                    fetched.push(provider.read_bytes(&path).await?);
                }
                Ok::<_, ResourceError>((group, fetched))
            });
        }

        let mut groups = Vec::new();
        while let Some(joined) = set.join_next().await {
            let result = joined
                .map_err(|e| PetError::load(LoadStage::Motions, LoadFailure::Join(e.to_string())))?;
            match result {
                Ok(group) => groups.push(group),
                Err(e) => {
                    set.abort_all();
                    return Err(PetError::load(LoadStage::Motions, e));
                }
            }
        }
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        let (eye_blink_ids, lip_sync_ids) = {
            let (eye, lip) = model.effect_ids();
            (eye.to_vec(), lip.to_vec())
        };

        for (group, fetched) in groups {
            for (index, bytes) in fetched.into_iter().enumerate() {
                let key = motion_key(&group, index);
                let Some(motion) = settings.motion(&group, index) else {
                    continue;
                };

                let engine = model.engine_mut();
                let handle = engine
                    .load_motion(&key, &bytes)
                    .map_err(|e| PetError::load(LoadStage::Motions, e))?;
                engine.configure_motion(
                    handle,
                    &MotionConfig {
                        fade_in: motion.fade_in(),
                        fade_out: motion.fade_out(),
                        eye_blink_ids: eye_blink_ids.clone(),
                        lip_sync_ids: lip_sync_ids.clone(),
                    },
                );
                model.register_motion(&key, handle);
            }
        }

        debug!(count = model.motion_count(), "动作加载完成");
        Ok(())
    }

    async fn setup_textures(
        &self,
        model: &mut AnimationModel,
        settings: &ModelSettings,
    ) -> PetResult<()> {
        model
            .engine_mut()
            .create_renderer()
            .map_err(|e| PetError::load(LoadStage::Renderer, e))?;

        let home = model.home_dir().to_string();
        let mut set = JoinSet::new();
        for (unit, file) in settings.textures() {
            let provider = Arc::clone(&self.provider);
            let path = join_logical(&home, file);
            set.spawn(async move {
                let bytes = provider.read_bytes(&path).await?;
                let decoded = tokio::task::spawn_blocking(move || decode_texture(&bytes))
                    .await
                    .map_err(|e| LoadFailure::Join(e.to_string()))?
                    .map_err(|source| LoadFailure::Texture { path, source })?;
                Ok::<_, LoadFailure>((unit, decoded))
            });
        }

        let mut textures: Vec<(usize, TextureImage)> = Vec::new();
        while let Some(joined) = set.join_next().await {
            let result = joined
                .map_err(|e| PetError::load(LoadStage::Textures, LoadFailure::Join(e.to_string())))?;
            match result {
                Ok(texture) => textures.push(texture),
                Err(e) => {
                    set.abort_all();
                    return Err(PetError::load(LoadStage::Textures, e));
                }
            }
        }

        if textures.is_empty() {
            warn!(home = %home, "模型没有可用的纹理");
        }

        textures.sort_by_key(|(unit, _)| *unit);
        for (unit, texture) in &textures {
            model
                .engine_mut()
                .bind_texture(*unit, texture)
                .map_err(|e| PetError::load(LoadStage::Textures, e))?;
        }

        debug!(count = textures.len(), "纹理上传完成");
        Ok(())
    }
}

/// 并发拉取一组路径，结果与输入顺序一致
///
/// 任一失败立即中止其余拉取并返回该错误。
async fn fetch_all<P: AssetProvider>(
    provider: &Arc<P>,
    paths: Vec<String>,
) -> Result<Vec<Vec<u8>>, LoadFailure> {
    let mut results: Vec<Option<Vec<u8>>> = vec![None; paths.len()];
    let mut set = JoinSet::new();

    for (index, path) in paths.into_iter().enumerate() {
        let provider = Arc::clone(provider);
        set.spawn(async move { (index, provider.read_bytes(&path).await) });
    }

    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.map_err(|e| LoadFailure::Join(e.to_string()))?;
        match result {
            Ok(bytes) => results[index] = Some(bytes),
            Err(e) => {
                set.abort_all();
                return Err(e.into());
            }
        }
    }

    Ok(results.into_iter().flatten().collect())
}
