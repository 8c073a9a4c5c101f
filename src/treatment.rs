// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/treatment.rs - 病害防治建议
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use serde::Serialize;
use tracing::debug;

use crate::model::DiseaseCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  None,
  Low,
  Medium,
  High,
  Unknown,
}

/// 一条防治建议，文本为越南语
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advisory {
  #[serde(skip)]
  pub label: &'static str,
  pub diagnosis: &'static str,
  pub treatment: &'static str,
  pub prevention: &'static [&'static str],
  pub severity: Severity,
}

/// 查不到时返回的通用建议
pub const UNKNOWN_ADVISORY: Advisory = Advisory {
  label: "",
  diagnosis: "Không tìm thấy thông tin cụ thể cho bệnh này",
  treatment: "Vui lòng tham khảo ý kiến chuyên gia nông nghiệp",
  prevention: &[
    "Giữ vệ sinh vườn cây sạch sẽ",
    "Theo dõi cây thường xuyên",
    "Tham khảo trạm khuyến nông địa phương",
  ],
  severity: Severity::Unknown,
};

// 以显示名称为键；霜霉病与病毒花叶病没有条目，khô vằn 与 gỉ sắt 没有对应类别
static ADVISORIES: [Advisory; 15] = [
  Advisory {
    label: "Lá khỏe mạnh",
    diagnosis: "Lá cây khỏe mạnh, không có dấu hiệu bệnh",
    treatment: "Tiếp tục chăm sóc bình thường và theo dõi",
    prevention: &[
      "Duy trì tưới nước đều đặn",
      "Bón phân cân đối NPK",
      "Loại bỏ cỏ dại xung quanh",
    ],
    severity: Severity::None,
  },
  Advisory {
    label: "Bệnh đốm lá",
    diagnosis: "Bệnh do nấm gây ra, xuất hiện các đốm tròn trên lá",
    treatment: "Sử dụng thuốc trừ nấm Mancozeb 80WP hoặc Carbendazim",
    prevention: &[
      "Tỉa bớt lá bị bệnh và tiêu hủy",
      "Tránh tưới nước vào lá, chỉ tưới gốc",
      "Cải thiện thoát nước, không để úng",
      "Phun thuốc dự phòng 7-10 ngày/lần",
    ],
    severity: Severity::Medium,
  },
  Advisory {
    label: "Bệnh héo xanh",
    diagnosis: "Bệnh do vi khuẩn, cây héo nhanh dù đất còn ẩm",
    treatment: "Sử dụng thuốc kháng sinh nông nghiệp (Streptomycin Sulfate)",
    prevention: &[
      "Nhổ bỏ và tiêu hủy cây bị bệnh",
      "Khử trùng đất bằng vôi bột",
      "Luân canh với các loại cây khác",
      "Không trồng lại cùng loại cây trong 2-3 năm",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh đạo ôn",
    diagnosis: "Bệnh nấm nguy hiểm, lây lan nhanh trong điều kiện ẩm",
    treatment: "Phun thuốc Tricyclazole 75WP hoặc Isoprothiolane",
    prevention: &[
      "Tăng cường thông thoáng cho cây",
      "Bón phân Kali để tăng sức đề kháng",
      "Phun thuốc phòng bệnh khi thời tiết mưa ẩm",
      "Thu hoạch và tiêu hủy rơm rạ sau vụ",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh khô vằn",
    diagnosis: "Bệnh do nấm, lá có vằn vàng khô dần",
    treatment: "Sử dụng Validamycin hoặc Propiconazole",
    prevention: &[
      "Cắt bỏ lá bị bệnh",
      "Phun thuốc đều đặn mỗi 10-14 ngày",
      "Bón phân hữu cơ tăng sức đề kháng",
      "Tránh bón đạm quá nhiều",
    ],
    severity: Severity::Medium,
  },
  Advisory {
    label: "Bệnh thán thư",
    diagnosis: "Bệnh nấm, tạo vết lõm trên thân và trái",
    treatment: "Phun Copper Oxychloride hoặc Mancozeb",
    prevention: &[
      "Tỉa cành tạo thoáng",
      "Phun thuốc phòng bệnh trước mưa",
      "Thu gom và tiêu hủy phần cây bị bệnh",
      "Sử dụng giống kháng bệnh",
    ],
    severity: Severity::Medium,
  },
  Advisory {
    label: "Bệnh gỉ sắt",
    diagnosis: "Bệnh nấm gỉ sắt, xuất hiện đốm màu nâu đỏ",
    treatment: "Sử dụng Tebuconazole hoặc Triadimefon",
    prevention: &[
      "Loại bỏ lá già và lá bị bệnh",
      "Tăng cường kali và photpho",
      "Phun thuốc 2-3 lần cách nhau 7-10 ngày",
      "Giữ khoảng cách trồng hợp lý",
    ],
    severity: Severity::Low,
  },
  Advisory {
    label: "Bệnh xoăn lá",
    diagnosis: "Do virus hoặc rệp gây ra, lá xoăn và biến dạng",
    treatment: "Phun thuốc diệt rệp (Imidacloprid hoặc Acetamiprid)",
    prevention: &[
      "Nhổ bỏ cây bị bệnh nặng",
      "Diệt rệp truyền bệnh bằng bẫy vàng",
      "Sử dụng giống kháng virus",
      "Trồng cây bẫy xung quanh vườn",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh thối rễ",
    diagnosis: "Nấm tấn công rễ, cây vàng lá và chậm lớn",
    treatment: "Tưới Metalaxyl hoặc Fosetyl-Al vào gốc",
    prevention: &[
      "Cải thiện hệ thống thoát nước",
      "Tránh tưới nước ngập úng",
      "Bón vôi để cân bằng pH đất",
      "Sử dụng giống ghép có gốc kháng bệnh",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh nấm phấn trắng",
    diagnosis: "Nấm phấn trắng phủ trên bề mặt lá",
    treatment: "Phun Sulfur hoặc Myclobutanil",
    prevention: &[
      "Tăng độ thoáng, cắt tỉa cành",
      "Tránh tưới nước lên lá",
      "Phun dung dịch lưu huỳnh định kỳ",
      "Trồng cây giữa các hàng đủ khoảng cách",
    ],
    severity: Severity::Low,
  },
  Advisory {
    label: "Bệnh đốm vòng",
    diagnosis: "Xuất hiện vết đốm hình vòng tròn trên lá",
    treatment: "Sử dụng thuốc Chlorothalonil hoặc Mancozeb",
    prevention: &[
      "Loại bỏ lá bệnh và tiêu hủy",
      "Không tưới nước lên tán lá",
      "Luân canh với cây họ khác",
      "Phun thuốc phòng bệnh định kỳ",
    ],
    severity: Severity::Medium,
  },
  Advisory {
    label: "Bệnh khảm lá",
    diagnosis: "Lá có vết khảm màu vàng xanh xen kẽ do virus",
    treatment: "Không có thuốc đặc trị, phòng ngừa côn trùng truyền bệnh",
    prevention: &[
      "Nhổ bỏ cây bệnh ngay khi phát hiện",
      "Phun thuốc trừ rệp, bọ trĩ, ve sầu",
      "Sử dụng giống kháng virus",
      "Khử trùng dụng cụ canh tác",
      "Trồng cây rào chắn ngăn côn trùng",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh thối quả",
    diagnosis: "Quả bị thối, có mùi hôi, lan nhanh",
    treatment: "Phun Copper hydroxide hoặc Mancozeb",
    prevention: &[
      "Thu hoạch đúng lúc, tránh chín quá",
      "Tránh làm thương quả khi thu hoạch",
      "Bảo quản nơi khô ráo, thoáng mát",
      "Phun thuốc phòng bệnh trước thu hoạch",
      "Loại bỏ quả bệnh ngay",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh héo rũ",
    diagnosis: "Cây héo rũ, lá vàng rụng, thân yếu",
    treatment: "Tưới Metalaxyl hoặc Fosetyl-Al vào gốc cây",
    prevention: &[
      "Cải thiện thoát nước, tránh ngập úng",
      "Không trồng quá dày",
      "Bón phân cân đối, tránh bón đạm nhiều",
      "Sử dụng giống kháng bệnh",
      "Xử lý đất trước khi trồng",
    ],
    severity: Severity::High,
  },
  Advisory {
    label: "Bệnh vàng lá",
    diagnosis: "Lá chuyển vàng, cây sinh trưởng kém",
    treatment: "Bón phân đạm, phun phân lá chứa Nitrogen và vi lượng",
    prevention: &[
      "Bón phân cân đối NPK",
      "Kiểm tra và cải thiện pH đất",
      "Bổ sung vi lượng (Fe, Zn, Mg)",
      "Tưới nước đầy đủ, tránh úng",
      "Xử lý sâu bệnh hại rễ nếu có",
    ],
    severity: Severity::Low,
  },
];

/// 按类别键或显示名称查询防治建议，查不到时返回 [`UNKNOWN_ADVISORY`]
pub fn lookup_treatment(key_or_label: &str) -> &'static Advisory {
  let label = DiseaseCategory::from_key(key_or_label)
    .map(DiseaseCategory::display_label)
    .unwrap_or(key_or_label);

  match ADVISORIES.iter().find(|advisory| advisory.label == label) {
    Some(advisory) => advisory,
    None => {
      debug!("没有 {} 的防治建议，使用通用建议", key_or_label);
      &UNKNOWN_ADVISORY
    }
  }
}

pub fn advisory_for(category: DiseaseCategory) -> &'static Advisory {
  lookup_treatment(category.display_label())
}

/// 数据库中全部病害的显示名称
pub fn known_labels() -> impl Iterator<Item = &'static str> {
  ADVISORIES.iter().map(|advisory| advisory.label)
}

pub fn severity_of(key_or_label: &str) -> Severity {
  lookup_treatment(key_or_label).severity
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_and_label_give_same_advisory() {
    assert_eq!(lookup_treatment("leaf_spot"), lookup_treatment("Bệnh đốm lá"));
    assert_eq!(severity_of("leaf_spot"), Severity::Medium);
    assert!(lookup_treatment("leaf_spot").treatment.contains("Mancozeb"));
  }

  #[test]
  fn healthy_has_no_severity() {
    let advisory = advisory_for(DiseaseCategory::Healthy);
    assert_eq!(advisory.severity, Severity::None);
    assert_eq!(advisory.prevention.len(), 3);
  }

  #[test]
  fn missing_entries_fall_back() {
    for key in ["downy_mildew", "virus_mosaic", "no_such_disease"] {
      assert_eq!(lookup_treatment(key), &UNKNOWN_ADVISORY, "{}", key);
    }
    assert_eq!(severity_of("virus_mosaic"), Severity::Unknown);
  }

  #[test]
  fn labels_without_category_are_known() {
    assert_eq!(severity_of("Bệnh gỉ sắt"), Severity::Low);
    assert_eq!(known_labels().count(), 15);
  }

  #[test]
  fn thirteen_categories_have_entries() {
    let covered = DiseaseCategory::ALL
      .into_iter()
      .filter(|&c| advisory_for(c).severity != Severity::Unknown)
      .count();
    assert_eq!(covered, 13);
  }

  #[test]
  fn severity_serializes_lowercase() {
    let json = serde_json::to_string(&Severity::Medium).expect("可序列化");
    assert_eq!(json, "\"medium\"");
  }
}
