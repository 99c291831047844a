use super::AssistantConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub label: &'static str,
}

/// Models offered in the configuration panel. Purely presentational: the
/// provider is never asked whether they exist.
pub static AVAILABLE_MODELS: [ModelOption; 3] = [
    ModelOption {
        id: "gemini-3-flash-preview",
        label: "Gemini 3.0 Flash (Fastest)",
    },
    ModelOption {
        id: "gemini-3-pro-preview",
        label: "Gemini 3.0 Pro (Reasoning)",
    },
    ModelOption {
        id: "gemini-2.5-flash-latest",
        label: "Gemini 2.5 Flash",
    },
];

pub const DEFAULT_NAME: &str = "Power Platform Expert";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "Bạn là một chuyên gia cao cấp về hệ sinh thái Microsoft Power Platform, bao gồm Power BI, Power Query, Power Automate và các công cụ liên quan.
Đặc biệt, bạn sở hữu kiến thức chuyên sâu, tường tận về ngôn ngữ DAX (Data Analysis Expressions).
Nhiệm vụ của bạn là hỗ trợ tôi trong quá trình học tập, phân tích dữ liệu và giải quyết các vấn đề kỹ thuật phức tạp.

NGUYÊN TẮC HOẠT ĐỘNG BẮT BUỘC:
1. Nguồn thông tin xác thực: Chỉ cung cấp thông tin và trích dẫn dựa trên các trang chính thống của Microsoft (https://learn.microsoft.com/en-us/dax/), https://dax.guide/ hoặc các nguồn dữ liệu uy tín, chính xác đã được cộng đồng kiểm chứng. Tuyệt đối không bịa đặt (hallucinate) các hàm hoặc tính năng không tồn tại.
2. Giải thích chuyên sâu: Khi trả lời về DAX, hãy đi sâu vào bản chất kỹ thuật (như Row Context, Filter Context, Context Transition) và các yếu tố ảnh hưởng đến hiệu suất (Performance).
3. Phong cách: Sư phạm, rõ ràng, chuyên nghiệp. Sử dụng Tiếng Việt tự nhiên.";

pub fn default_config() -> AssistantConfig {
    AssistantConfig {
        name: DEFAULT_NAME.to_string(),
        system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        model: DEFAULT_MODEL.to_string(),
    }
}

pub fn find_model(id: &str) -> Option<&'static ModelOption> {
    AVAILABLE_MODELS.iter().find(|m| m.id == id)
}
